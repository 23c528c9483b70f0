use std::fs;
use std::path::Path;

// Each integration-test crate compiles this module separately and most use
// only one of the writers; keep the allowances per helper so the others stay
// warning-free.
#[allow(dead_code)]
pub fn write_source(path: &Path, contents: &str) {
    fs::write(path, contents).unwrap_or_else(|err| panic!("write source: {err}"));
}

#[allow(dead_code)]
pub fn write_sources(root: &Path, sources: &[(&str, &str)]) {
    for (relative, contents) in sources {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|err| panic!("create dir {}: {err}", parent.display()));
        }
        write_source(&path, contents);
    }
}
