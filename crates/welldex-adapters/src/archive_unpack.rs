//! ZIP decompression for bulk downloads (spec.md §4.2): extract the first
//! matching member into the same dated staging directory and treat it as
//! the payload.

use std::fs::File;
use std::io::copy;
use std::path::{Path, PathBuf};

use welldex_common::{Result, WelldexError};

/// Decompress `zip_path` into `dest_dir`, returning the path of the first
/// member whose name satisfies `predicate`. Used when a source ships one
/// payload file inside a ZIP alongside READMEs/layout docs we don't want.
pub fn unzip_first_matching(
    zip_path: &Path,
    dest_dir: &Path,
    predicate: impl Fn(&str) -> bool,
) -> Result<PathBuf> {
    let file = File::open(zip_path).map_err(WelldexError::Io)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| WelldexError::Parse(format!("invalid zip {}: {e}", zip_path.display())))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| WelldexError::Parse(format!("corrupt zip entry {i}: {e}")))?;
        if entry.is_dir() || !predicate(entry.name()) {
            continue;
        }

        let out_path = dest_dir.join(
            Path::new(entry.name())
                .file_name()
                .ok_or_else(|| WelldexError::Parse(format!("unsafe zip entry name: {}", entry.name())))?,
        );
        let mut out_file = File::create(&out_path).map_err(WelldexError::Io)?;
        copy(&mut entry, &mut out_file).map_err(WelldexError::Io)?;
        return Ok(out_path);
    }

    Err(WelldexError::Parse(format!(
        "no matching member found in {}",
        zip_path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn make_zip(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::FileOptions::default();
        for (name, content) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn extracts_first_matching_member() {
        let tmp = tempfile::tempdir().unwrap();
        let zip_path = tmp.path().join("bundle.zip");
        make_zip(&zip_path, &[("readme.txt", "ignore me"), ("data.csv", "a|b\n1|2\n")]);

        let out = unzip_first_matching(&zip_path, tmp.path(), |name| name.ends_with(".csv")).unwrap();
        let contents = std::fs::read_to_string(out).unwrap();
        assert_eq!(contents, "a|b\n1|2\n");
    }

    #[test]
    fn no_matching_member_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let zip_path = tmp.path().join("bundle.zip");
        make_zip(&zip_path, &[("readme.txt", "ignore me")]);

        let result = unzip_first_matching(&zip_path, tmp.path(), |name| name.ends_with(".csv"));
        assert!(result.is_err());
    }
}
