use crate::util::datasets_root;

pub(crate) fn cmd_web(root: Option<&str>, bind: &str) -> anyhow::Result<()> {
    let root = datasets_root(root)?;
    kanjiset_web::serve(&root, bind)
}
