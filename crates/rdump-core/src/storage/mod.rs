//! Download persistence: writes captured attachments into the output directory.
//!
//! Each attachment is copied in fixed-size chunks into `<name>.part` and
//! renamed onto `<name>` once complete, replacing any existing file. Input and
//! output are released independently; a failure releasing the output after a
//! finished copy is reported to the observer and does not fail the run.

mod writer;

pub use writer::PartFile;

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::attachment::Attachment;
use crate::checksum::StreamDigest;
use crate::error::DumpError;
use crate::observer::{DumpEvent, DumpObserver};
use crate::url_model::{sanitize_filename, DEFAULT_FILENAME, NAME_MAX};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Size of the copy buffer.
pub const COPY_CHUNK_BYTES: usize = 8 * 1024;

/// Path for the temp file: appends `.part` to the final path (e.g. `dump.sql` → `dump.sql.part`).
///
/// Names too long to take the suffix are shortened first, so the temp file
/// always fits in `NAME_MAX` bytes when the final name does.
pub fn temp_path(final_path: &Path) -> PathBuf {
    let name = match final_path.file_name() {
        Some(n) => n.to_string_lossy().into_owned(),
        None => {
            let mut o = final_path.as_os_str().to_owned();
            o.push(TEMP_SUFFIX);
            return PathBuf::from(o);
        }
    };
    let mut keep = name.len().min(NAME_MAX - TEMP_SUFFIX.len());
    while !name.is_char_boundary(keep) {
        keep -= 1;
    }
    final_path.with_file_name(format!("{}{}", &name[..keep], TEMP_SUFFIX))
}

/// Writes every attachment into `target_dir`, in order, and returns the saved filenames.
///
/// Fails with `NoAttachment` when there is nothing to save; the directory is
/// not touched in that case.
pub fn persist(
    attachments: Vec<Attachment>,
    target_dir: &Path,
    observer: &dyn DumpObserver,
) -> Result<Vec<String>, DumpError> {
    if attachments.is_empty() {
        return Err(DumpError::NoAttachment);
    }
    if attachments.len() > 1 {
        observer.on_event(&DumpEvent::MultipleAttachments {
            count: attachments.len(),
        });
    }

    let mut saved = Vec::with_capacity(attachments.len());
    for attachment in attachments {
        saved.push(save_one(attachment, target_dir, observer)?);
    }
    Ok(saved)
}

fn save_one(
    attachment: Attachment,
    target_dir: &Path,
    observer: &dyn DumpObserver,
) -> Result<String, DumpError> {
    let mut filename = sanitize_filename(attachment.suggested_filename());
    if filename.is_empty() {
        filename = DEFAULT_FILENAME.to_string();
    }
    observer.on_event(&DumpEvent::Saving {
        filename: filename.clone(),
    });

    let final_path = target_dir.join(&filename);
    let write_err = |source: io::Error| DumpError::FileWrite {
        path: final_path.clone(),
        filename: filename.clone(),
        source,
    };

    let mut input = attachment
        .open()
        .map_err(|source| DumpError::AttachmentRead {
            filename: filename.clone(),
            source,
        })?;
    let mut output = PartFile::create(&final_path).map_err(write_err)?;

    let mut digest = StreamDigest::new();
    let mut buf = vec![0u8; COPY_CHUNK_BYTES];
    loop {
        let n = match input.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(write_err(e)),
        };
        output.write_chunk(&buf[..n]).map_err(write_err)?;
        digest.update(&buf[..n]);
    }
    drop(input);

    if let Err(e) = output.close() {
        observer.on_event(&DumpEvent::CloseFailed {
            path: output.temp_path().to_path_buf(),
            error: e.to_string(),
        });
    }
    output.finalize().map_err(write_err)?;

    let (bytes, sha256) = digest.finish();
    observer.on_event(&DumpEvent::Saved {
        filename: filename.clone(),
        bytes,
        sha256,
    });
    Ok(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::AttachmentSource;
    use std::cell::RefCell;
    use std::fs;
    use url::Url;

    fn url() -> Url {
        Url::parse("http://example.test/admin").unwrap()
    }

    fn ignore(_: &DumpEvent) {}

    struct Unreadable;

    impl AttachmentSource for Unreadable {
        fn open(self: Box<Self>) -> io::Result<Box<dyn Read + Send>> {
            Err(io::Error::new(io::ErrorKind::Other, "gone"))
        }
    }

    struct FailsMidway;

    impl Read for FailsMidway {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
        }
    }

    impl AttachmentSource for FailsMidway {
        fn open(self: Box<Self>) -> io::Result<Box<dyn Read + Send>> {
            Ok(self)
        }
    }

    #[test]
    fn temp_path_appends_part() {
        let p = temp_path(Path::new("dump.sql.gz"));
        assert_eq!(p.to_string_lossy(), "dump.sql.gz.part");
    }

    #[test]
    fn temp_path_fits_name_max() {
        let name = format!("{}.sql.gz", "a".repeat(246));
        let p = temp_path(&Path::new("/tmp/out").join(&name));
        let temp_name = p.file_name().unwrap().to_string_lossy().into_owned();
        assert!(temp_name.len() <= NAME_MAX);
        assert!(temp_name.ends_with(TEMP_SUFFIX));
        assert_eq!(p.parent(), Some(Path::new("/tmp/out")));
    }

    #[test]
    fn longest_allowed_name_is_saved() {
        let dir = tempfile::tempdir().unwrap();
        let name = format!("{}.sql.gz", "a".repeat(246));
        assert_eq!(name.len(), 253);
        let saved = persist(
            vec![Attachment::from_bytes(name.clone(), url(), b"dump".to_vec())],
            dir.path(),
            &ignore,
        )
        .unwrap();
        assert_eq!(saved, vec![name.clone()]);
        assert_eq!(fs::read(dir.path().join(&name)).unwrap(), b"dump");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn empty_sequence_is_no_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let err = persist(Vec::new(), dir.path(), &ignore).unwrap_err();
        assert!(matches!(err, DumpError::NoAttachment));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn writes_bytes_and_returns_names_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let big: Vec<u8> = (0u8..=255).cycle().take(3 * COPY_CHUNK_BYTES + 5).collect();
        let attachments = vec![
            Attachment::from_bytes("dump.sql.gz", url(), b"0123456789abcdefg".to_vec()),
            Attachment::from_bytes("files.tar", url(), big.clone()),
        ];
        let events = RefCell::new(Vec::new());
        let observer = |e: &DumpEvent| events.borrow_mut().push(e.clone());

        let saved = persist(attachments, dir.path(), &observer).unwrap();

        assert_eq!(saved, vec!["dump.sql.gz", "files.tar"]);
        assert_eq!(fs::read(dir.path().join("dump.sql.gz")).unwrap(), b"0123456789abcdefg");
        assert_eq!(fs::read(dir.path().join("files.tar")).unwrap(), big);
        assert!(!dir.path().join("dump.sql.gz.part").exists());

        let events = events.into_inner();
        assert_eq!(events[0], DumpEvent::MultipleAttachments { count: 2 });
        assert!(events.iter().any(|e| matches!(
            e,
            DumpEvent::Saved { filename, bytes: 17, .. } if filename == "dump.sql.gz"
        )));
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("dump.sql"), b"old and longer content").unwrap();
        let saved = persist(
            vec![Attachment::from_bytes("dump.sql", url(), b"new".to_vec())],
            dir.path(),
            &ignore,
        )
        .unwrap();
        assert_eq!(saved, vec!["dump.sql"]);
        assert_eq!(fs::read(dir.path().join("dump.sql")).unwrap(), b"new");
    }

    #[test]
    fn unsafe_names_stay_inside_target() {
        let dir = tempfile::tempdir().unwrap();
        let inner = dir.path().join("out");
        fs::create_dir(&inner).unwrap();
        let saved = persist(
            vec![Attachment::from_bytes("../escape.sql", url(), b"x".to_vec())],
            &inner,
            &ignore,
        )
        .unwrap();
        assert_eq!(saved, vec!["escape.sql"]);
        assert!(inner.join("escape.sql").exists());
        assert!(!dir.path().join("escape.sql").exists());
    }

    #[test]
    fn open_failure_is_attachment_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let a = Attachment::new("dump.sql", url(), None, Box::new(Unreadable));
        let err = persist(vec![a], dir.path(), &ignore).unwrap_err();
        match err {
            DumpError::AttachmentRead { filename, .. } => assert_eq!(filename, "dump.sql"),
            other => panic!("expected AttachmentRead, got {other:?}"),
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn read_failure_mid_copy_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = Attachment::new("dump.sql", url(), None, Box::new(FailsMidway));
        let err = persist(vec![a], dir.path(), &ignore).unwrap_err();
        match err {
            DumpError::FileWrite { path, filename, .. } => {
                assert_eq!(filename, "dump.sql");
                assert_eq!(path, dir.path().join("dump.sql"));
            }
            other => panic!("expected FileWrite, got {other:?}"),
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_target_dir_is_file_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = persist(
            vec![Attachment::from_bytes("dump.sql", url(), b"x".to_vec())],
            &dir.path().join("missing"),
            &ignore,
        )
        .unwrap_err();
        assert_eq!(err.kind(), "file-write");
    }

    #[test]
    fn first_failure_stops_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let attachments = vec![
            Attachment::from_bytes("a.sql", url(), b"a".to_vec()),
            Attachment::new("b.sql", url(), None, Box::new(Unreadable)),
            Attachment::from_bytes("c.sql", url(), b"c".to_vec()),
        ];
        assert!(persist(attachments, dir.path(), &ignore).is_err());
        assert!(dir.path().join("a.sql").exists());
        assert!(!dir.path().join("c.sql").exists());
    }
}
