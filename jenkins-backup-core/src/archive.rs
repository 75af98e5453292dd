/*!
Tar+gzip packaging of a snapshot and its raw configuration documents.

Archive layout:

```text
jobs/<jobName>.xml      one per job, raw server document
views/<viewName>.xml    one per non-default view, raw server document
metadata.yml            serialized snapshot
```

Entries are written in a stable order (job documents alphabetically, then
view documents alphabetically, then the metadata entry) so two consecutive
backups of an unchanged server differ only in the timestamp field. Both
packing and reading stage through an exclusive temporary directory that is
removed on success and failure alike; the archive itself is published
atomically, so a failed backup never leaves a discoverable partial file.
*/

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, info};

use crate::metadata::Snapshot;
use crate::store::{DocKind, DocumentStore};
use crate::{BackupError, Result};

/// Name of the snapshot metadata entry inside an archive.
pub const METADATA_ENTRY: &str = "metadata.yml";

/// Default base name for archives produced by `backup`.
pub const DEFAULT_ARCHIVE_BASE: &str = "jenkins";

/// Package a snapshot and its documents into `<base_name>-<ts>.tar.gz` under
/// `output_dir`, returning the published path.
pub fn pack(
    snapshot: &Snapshot,
    store: &DocumentStore,
    output_dir: &Path,
    base_name: &str,
) -> Result<PathBuf> {
    let staging = TempDir::new()?;
    stage(snapshot, store, staging.path())?;

    let archive_path = output_dir.join(snapshot.archive_file_name(base_name));
    let scratch = NamedTempFile::new_in(output_dir).map_err(|e| {
        BackupError::archive_write(format!(
            "cannot stage archive in {}: {e}",
            output_dir.display()
        ))
    })?;

    let encoder = GzEncoder::new(scratch, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    // DocumentStore iterates jobs alphabetically, then views alphabetically.
    for (kind, name, _) in store.iter() {
        let entry_name = format!("{}/{name}.xml", kind.dir());
        debug!(entry = entry_name.as_str(), "adding archive entry");
        let staged = staging.path().join(kind.dir()).join(format!("{name}.xml"));
        builder
            .append_path_with_name(&staged, &entry_name)
            .map_err(|e| BackupError::archive_write(format!("cannot add {entry_name}: {e}")))?;
    }
    builder
        .append_path_with_name(staging.path().join(METADATA_ENTRY), METADATA_ENTRY)
        .map_err(|e| BackupError::archive_write(format!("cannot add {METADATA_ENTRY}: {e}")))?;

    let encoder = builder
        .into_inner()
        .map_err(|e| BackupError::archive_write(format!("cannot finish archive: {e}")))?;
    let scratch = encoder
        .finish()
        .map_err(|e| BackupError::archive_write(format!("cannot finish compression: {e}")))?;
    scratch.persist(&archive_path).map_err(|e| {
        BackupError::archive_write(format!("cannot publish {}: {e}", archive_path.display()))
    })?;

    info!(archive = %archive_path.display(), entries = store.len() + 1, "archive written");
    Ok(archive_path)
}

fn stage(snapshot: &Snapshot, store: &DocumentStore, dir: &Path) -> Result<()> {
    fs::create_dir(dir.join(DocKind::Job.dir()))?;
    fs::create_dir(dir.join(DocKind::View.dir()))?;
    for (kind, name, document) in store.iter() {
        fs::write(dir.join(kind.dir()).join(format!("{name}.xml")), document)?;
    }
    fs::write(dir.join(METADATA_ENTRY), snapshot.to_yaml()?)?;
    Ok(())
}

/// Extract an archive and reconstitute the snapshot and document store.
///
/// Entries outside `jobs/`, `views/` and the metadata entry are extracted but
/// otherwise ignored. A missing or unparsable metadata entry is fatal, as is
/// a missing document for any job or view the snapshot references.
pub fn read(archive_path: &Path) -> Result<(Snapshot, DocumentStore)> {
    let file = File::open(archive_path).map_err(|e| {
        BackupError::archive_read(format!("cannot open {}: {e}", archive_path.display()))
    })?;

    let staging = TempDir::new()?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    archive.unpack(staging.path()).map_err(|e| {
        BackupError::archive_read(format!("cannot extract {}: {e}", archive_path.display()))
    })?;

    let metadata_text = fs::read_to_string(staging.path().join(METADATA_ENTRY))
        .map_err(|_| BackupError::archive_corrupt(format!("missing {METADATA_ENTRY} entry")))?;
    let snapshot = Snapshot::from_yaml(&metadata_text)
        .map_err(|e| BackupError::archive_corrupt(format!("unparsable {METADATA_ENTRY}: {e}")))?;

    let mut store = DocumentStore::new();
    for job in &snapshot.jobs.names {
        let document = read_document(staging.path(), DocKind::Job, job)?;
        store.insert(DocKind::Job, job.as_str(), document);
    }
    for view in &snapshot.views {
        let document = read_document(staging.path(), DocKind::View, &view.name)?;
        store.insert(DocKind::View, view.name.as_str(), document);
    }

    debug!(jobs = snapshot.jobs.count, views = snapshot.views.len(), "archive read");
    Ok((snapshot, store))
}

fn read_document(root: &Path, kind: DocKind, name: &str) -> Result<String> {
    fs::read_to_string(root.join(kind.dir()).join(format!("{name}.xml")))
        .map_err(|_| BackupError::archive_corrupt(format!("missing document for {kind} '{name}'")))
}
