pub(crate) mod build;
pub(crate) mod compact;
pub(crate) mod duplicates;
pub(crate) mod export;
pub(crate) mod inspect;
pub(crate) mod labels;
pub(crate) mod list;
pub(crate) mod mapping;
pub(crate) mod mark;
pub(crate) mod validate;
pub(crate) mod web;
