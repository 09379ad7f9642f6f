pub use menukit::i18n::{resolve_lang, Lang};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum K {
    AllDownloads,
    NoDownloads,
    ReloadConfig,
    Quit,
    TooltipTitle,
    TooltipActive,
}

pub fn t(lang: Lang, k: K) -> &'static str {
    match (lang, k) {
        (Lang::ZhCn, K::AllDownloads) => "全部下载",
        (Lang::En, K::AllDownloads) => "All downloads",

        (Lang::ZhCn, K::NoDownloads) => "没有下载",
        (Lang::En, K::NoDownloads) => "No downloads",

        (Lang::ZhCn, K::ReloadConfig) => "重载配置",
        (Lang::En, K::ReloadConfig) => "Reload config",

        (Lang::ZhCn, K::Quit) => "退出",
        (Lang::En, K::Quit) => "Quit",

        (Lang::ZhCn, K::TooltipTitle) => "下载",
        (Lang::En, K::TooltipTitle) => "Downloads",

        (Lang::ZhCn, K::TooltipActive) => "活动",
        (Lang::En, K::TooltipActive) => "active",
    }
}
