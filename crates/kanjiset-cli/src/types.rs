use serde::Serialize;

#[derive(Serialize)]
pub(crate) struct LabelsJson<'a> {
    pub(crate) outfile: &'a str,
    pub(crate) source: &'a str,
    pub(crate) labels: &'a [String],
    pub(crate) backup: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct ListEntryJson {
    pub(crate) name: String,
    pub(crate) path: String,
    pub(crate) labels: usize,
    pub(crate) fonts: usize,
    pub(crate) records: usize,
    pub(crate) invalid_records: usize,
    pub(crate) invalid_fonts: usize,
    pub(crate) completed_labels: usize,
}

#[derive(Serialize)]
pub(crate) struct InspectJson<'a> {
    pub(crate) name: &'a str,
    pub(crate) source: &'a str,
    pub(crate) labels: &'a [String],
    pub(crate) fonts: Vec<&'a str>,
    pub(crate) records: usize,
    pub(crate) invalid_records: &'a [String],
    pub(crate) invalid_fonts: &'a [String],
    pub(crate) completed_labels: &'a [String],
    pub(crate) blank_combinations: usize,
    pub(crate) unsupported_combinations: usize,
}

#[derive(Serialize)]
pub(crate) struct LabelRecordJson<'a> {
    pub(crate) hash: &'a str,
    pub(crate) font_name: &'a str,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) seek_start: u64,
    pub(crate) seek_end: u64,
    pub(crate) invalid: bool,
}

#[derive(Serialize)]
pub(crate) struct DuplicateGroupJson<'a> {
    pub(crate) hash: &'a str,
    pub(crate) records: Vec<DuplicateMemberJson<'a>>,
}

#[derive(Serialize)]
pub(crate) struct DuplicateMemberJson<'a> {
    pub(crate) character: &'a str,
    pub(crate) font_name: &'a str,
    pub(crate) invalid: bool,
}

#[derive(Serialize)]
pub(crate) struct MarkJson<'a> {
    pub(crate) dataset: &'a str,
    pub(crate) mark: &'a str,
    pub(crate) value: &'a str,
    pub(crate) changed: bool,
}

#[derive(Serialize)]
pub(crate) struct MappingJson<'a> {
    pub(crate) outfile: &'a str,
    pub(crate) labels: usize,
    pub(crate) backup: Option<String>,
}
