use std::path::PathBuf;

xflags::xflags! {
    /// Generate the grapheme cluster and width lookup module from a UCD
    /// data file.
    cmd grapheme-table-gen
        required ucd_path: PathBuf
    {
    }
}
