#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Lang {
    ZhCn,
    En,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum K {
    Start,
    Stop,
    MoveData,
    Category,
    Tags,
    None,
    Set,
    Clear,
    Pending,
}

pub fn detect_lang_from_env() -> Lang {
    let v = std::env::var("LC_ALL")
        .ok()
        .or_else(|| std::env::var("LC_MESSAGES").ok())
        .or_else(|| std::env::var("LANG").ok())
        .unwrap_or_default();
    let v = v.to_lowercase();
    if v.starts_with("zh") {
        Lang::ZhCn
    } else {
        Lang::En
    }
}

pub fn parse_lang_id(id: &str) -> Option<Lang> {
    match id {
        "zh-cn" | "zh_cn" | "zh" => Some(Lang::ZhCn),
        "en" | "en-us" | "en_us" => Some(Lang::En),
        _ => None,
    }
}

/// `"auto"` follows the environment; unknown ids do too.
pub fn resolve_lang(id: &str) -> Lang {
    if id == "auto" {
        detect_lang_from_env()
    } else {
        parse_lang_id(id).unwrap_or_else(detect_lang_from_env)
    }
}

/// Resource keys understood by [`item_text`].
pub fn key_for_resource(resource: &str) -> Option<K> {
    match resource {
        "menu.start" => Some(K::Start),
        "menu.stop" => Some(K::Stop),
        "menu.movedata" => Some(K::MoveData),
        "label.category" => Some(K::Category),
        "label.tags" => Some(K::Tags),
        "label.none" => Some(K::None),
        "label.set" => Some(K::Set),
        "Button.clear" => Some(K::Clear),
        "state.pending" => Some(K::Pending),
        _ => None,
    }
}

/// Display text for a resource key. `!text!` is literal text; unknown keys show as-is.
pub fn item_text(lang: Lang, resource: &str) -> String {
    if resource.len() >= 2 && resource.starts_with('!') && resource.ends_with('!') {
        return resource[1..resource.len() - 1].to_string();
    }
    match key_for_resource(resource) {
        Some(k) => t(lang, k).to_string(),
        None => resource.to_string(),
    }
}

pub fn t(lang: Lang, k: K) -> &'static str {
    match (lang, k) {
        (Lang::ZhCn, K::Start) => "开始",
        (Lang::En, K::Start) => "Start",

        (Lang::ZhCn, K::Stop) => "停止",
        (Lang::En, K::Stop) => "Stop",

        (Lang::ZhCn, K::MoveData) => "移动数据文件…",
        (Lang::En, K::MoveData) => "Move data files…",

        (Lang::ZhCn, K::Category) => "分类",
        (Lang::En, K::Category) => "Category",

        (Lang::ZhCn, K::Tags) => "标签",
        (Lang::En, K::Tags) => "Tags",

        (Lang::ZhCn, K::None) => "无",
        (Lang::En, K::None) => "None",

        (Lang::ZhCn, K::Set) => "设置…",
        (Lang::En, K::Set) => "Set…",

        (Lang::ZhCn, K::Clear) => "清除",
        (Lang::En, K::Clear) => "Clear",

        (Lang::ZhCn, K::Pending) => "等待中",
        (Lang::En, K::Pending) => "Pending",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_and_known_resources() {
        assert_eq!(item_text(Lang::En, "!My Tag!"), "My Tag");
        assert_eq!(item_text(Lang::En, "label.tags"), "Tags");
        assert_eq!(item_text(Lang::ZhCn, "menu.stop"), "停止");
        assert_eq!(item_text(Lang::En, "plugin.custom.key"), "plugin.custom.key");
        assert_eq!(item_text(Lang::En, "!"), "!");
    }

    #[test]
    fn lang_ids() {
        assert_eq!(parse_lang_id("zh_cn"), Some(Lang::ZhCn));
        assert_eq!(parse_lang_id("fr"), None);
        assert_eq!(resolve_lang("en"), Lang::En);
    }
}
