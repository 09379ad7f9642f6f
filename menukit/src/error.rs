use thiserror::Error;

#[derive(Error, Debug)]
pub enum MenuError {
    #[error("menu item \"{0}\" is a check/radio item without a selection value")]
    MissingSelectionValue(String),

    #[error("no menu item at path {0:?}")]
    NoItemAtPath(Vec<usize>),
}
