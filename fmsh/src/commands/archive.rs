//! Zip and tar archives
//!
//! Creation walks a directory tree and stores every regular file, symlinks
//! to files included, under its `/`-separated path relative to the tree
//! root. The archive is assembled in a temporary file next to the
//! destination and renamed into place only once complete, so a failed run
//! leaves nothing behind at the destination.
//!
//! Extraction validates the whole archive before the destination directory
//! is created. Tar input may be gzip, xz or uncompressed; the compression is
//! recognised from the leading magic bytes rather than the file name.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use std::os::unix::fs::PermissionsExt;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::NamedTempFile;
use walkdir::WalkDir;
use xz2::read::XzDecoder;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::context::ShellContext;
use crate::error::{ShellError, ShellResult};
use crate::logger::Logger;

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const XZ_MAGIC: &[u8] = &[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00];

/// Suffixes stripped to name the default extraction directory, longest first.
const TAR_SUFFIXES: &[&str] = &[".tar.gz", ".tar.xz", ".tgz", ".txz", ".tar"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    /// Written as gzip-compressed tar; read with any supported compression.
    TarGz,
}

impl ArchiveFormat {
    const fn label(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::TarGz => "tar",
        }
    }
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One create or extract invocation.
///
/// For creation `source` is the directory to pack and `destination` the
/// archive file. For extraction `source` is the archive and `destination`
/// the directory receiving its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveJob {
    pub format: ArchiveFormat,
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl ArchiveJob {
    /// Job packing the directory `dir` into `archive`.
    pub fn pack(ctx: &ShellContext, format: ArchiveFormat, dir: &str, archive: &str) -> Self {
        Self {
            format,
            source: ctx.resolve(dir),
            destination: ctx.resolve(archive),
        }
    }

    /// Job unpacking `archive` into `dest`, or into a sibling directory named
    /// after the archive when `dest` is `None`.
    pub fn unpack(
        ctx: &ShellContext,
        format: ArchiveFormat,
        archive: &str,
        dest: Option<&str>,
    ) -> Self {
        let source = ctx.resolve(archive);
        let destination = match dest {
            Some(dest) => ctx.resolve(dest),
            None => default_extract_dir(format, &source),
        };
        Self {
            format,
            source,
            destination,
        }
    }

    /// Write the archive. Returns the names of the stored entries.
    pub fn create(&self, logger: &dyn Logger) -> ShellResult<Vec<String>> {
        match self.format {
            ArchiveFormat::Zip => create_zip(&self.source, &self.destination, logger),
            ArchiveFormat::TarGz => create_tar(&self.source, &self.destination, logger),
        }
    }

    /// Unpack the archive. Returns the names of the extracted entries.
    pub fn extract(&self, logger: &dyn Logger) -> ShellResult<Vec<String>> {
        match self.format {
            ArchiveFormat::Zip => extract_zip(&self.source, &self.destination, logger),
            ArchiveFormat::TarGz => extract_tar(&self.source, &self.destination, logger),
        }
    }
}

pub(crate) fn default_extract_dir(format: ArchiveFormat, archive: &Path) -> PathBuf {
    let parent = archive.parent().unwrap_or_else(|| Path::new("."));
    let file_name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let base = match format {
        ArchiveFormat::TarGz => TAR_SUFFIXES
            .iter()
            .find_map(|suffix| file_name.strip_suffix(suffix))
            .filter(|stem| !stem.is_empty())
            .map(str::to_string),
        ArchiveFormat::Zip => None,
    };
    let base = base.unwrap_or_else(|| {
        archive
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(file_name)
    });
    parent.join(base)
}

fn require_exists(path: &Path, what: &str) -> ShellResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ShellError::NotFound(format!(
            "{what} {} does not exist",
            path.display()
        )))
    }
}

/// Name stored in the archive for `path` found while walking `root`.
fn entry_name(root: &Path, path: &Path) -> String {
    let relative = path
        .strip_prefix(root)
        .ok()
        .filter(|rel| !rel.as_os_str().is_empty());
    match relative {
        Some(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

/// Regular files under `root` paired with their entry names, in walk order.
///
/// Symlinks to regular files count as files and are stored with the
/// target's contents. `skip` is left out so an archive written inside the
/// tree does not swallow itself.
fn collect_files(root: &Path, skip: &Path, context: &str) -> ShellResult<Vec<(PathBuf, String)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| ShellError::archive(context, e))?;
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if !is_file || entry.path() == skip {
            continue;
        }
        files.push((entry.path().to_path_buf(), entry_name(root, entry.path())));
    }
    Ok(files)
}

/// Temporary file in the destination's directory.
///
/// Requested as 0o666 so the process umask decides the final mode, the same
/// as for any newly created file.
fn staging_file(destination: &Path, context: &str) -> ShellResult<NamedTempFile> {
    let parent = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    tempfile::Builder::new()
        .prefix(".fmsh-")
        .permissions(fs::Permissions::from_mode(0o666))
        .tempfile_in(parent)
        .map_err(|e| ShellError::archive(context, e))
}

fn publish(staged: NamedTempFile, destination: &Path, context: &str) -> ShellResult<()> {
    staged
        .persist(destination)
        .map_err(|e| ShellError::archive(context, e.error))?;
    Ok(())
}

pub fn create_zip(source: &Path, archive: &Path, logger: &dyn Logger) -> ShellResult<Vec<String>> {
    const CONTEXT: &str = "Failed to create zip";
    require_exists(source, "Folder")?;
    if !source.is_dir() {
        return Err(ShellError::NotADirectory(format!(
            "Folder {} is not a directory",
            source.display()
        )));
    }

    logger.command(&format!("Creating zip {}", archive.display()));
    let mut staged = staging_file(archive, CONTEXT)?;
    let files = collect_files(source, staged.path(), CONTEXT)?;

    let fail = |e: zip::result::ZipError| ShellError::archive(CONTEXT, e);
    let mut writer = ZipWriter::new(staged.as_file_mut());
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut names = Vec::with_capacity(files.len());
    for (path, name) in files {
        writer.start_file(name.as_str(), options).map_err(fail)?;
        let mut input = File::open(&path).map_err(|e| ShellError::archive(CONTEXT, e))?;
        io::copy(&mut input, &mut writer).map_err(|e| ShellError::archive(CONTEXT, e))?;
        logger.success(&format!("Added {name}"));
        names.push(name);
    }
    writer.finish().map_err(fail)?;
    drop(writer);

    publish(staged, archive, CONTEXT)?;
    logger.success(&format!("Created {}", archive.display()));
    Ok(names)
}

pub fn create_tar(source: &Path, archive: &Path, logger: &dyn Logger) -> ShellResult<Vec<String>> {
    const CONTEXT: &str = "Failed to create tar";
    require_exists(source, "Folder")?;

    logger.command(&format!("Creating tar {}", archive.display()));
    let mut staged = staging_file(archive, CONTEXT)?;
    let files = collect_files(source, staged.path(), CONTEXT)?;

    let fail = |e: io::Error| ShellError::archive(CONTEXT, e);
    let encoder = GzEncoder::new(staged.as_file_mut(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    let mut names = Vec::with_capacity(files.len());
    for (path, name) in files {
        builder.append_path_with_name(&path, &name).map_err(fail)?;
        logger.success(&format!("Added {name}"));
        names.push(name);
    }
    builder
        .into_inner()
        .and_then(GzEncoder::finish)
        .map_err(fail)?;

    publish(staged, archive, CONTEXT)?;
    logger.success(&format!("Created {}", archive.display()));
    Ok(names)
}

fn open_zip(archive: &Path) -> ShellResult<ZipArchive<BufReader<File>>> {
    let file = File::open(archive).map_err(|e| ShellError::from_io(e, archive))?;
    ZipArchive::new(BufReader::new(file)).map_err(|_| {
        ShellError::InvalidArchive(format!("File {} is not a zip file", archive.display()))
    })
}

/// Read every entry to the end so stored checksums get verified.
fn verify_zip(zip: &mut ZipArchive<BufReader<File>>, archive: &Path) -> ShellResult<()> {
    for index in 0..zip.len() {
        let corrupt = |name: &str| {
            ShellError::InvalidArchive(format!(
                "File {} is corrupted at entry {name}",
                archive.display()
            ))
        };
        let mut entry = zip.by_index(index).map_err(|_| corrupt(&format!("#{index}")))?;
        let name = entry.name().to_string();
        io::copy(&mut entry, &mut io::sink()).map_err(|_| corrupt(&name))?;
    }
    Ok(())
}

pub fn extract_zip(archive: &Path, dest: &Path, logger: &dyn Logger) -> ShellResult<Vec<String>> {
    require_exists(archive, "File")?;
    let mut zip = open_zip(archive)?;
    verify_zip(&mut zip, archive)?;

    fs::create_dir_all(dest).map_err(|e| ShellError::from_io(e, dest))?;
    logger.command(&format!("Extracting {}", archive.display()));

    let names: Vec<String> = zip.file_names().map(str::to_string).collect();
    zip.extract(dest)
        .map_err(|e| ShellError::archive("Failed to extract zip", e))?;
    for name in &names {
        logger.success(&format!("Extracted {name}"));
    }
    Ok(names)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TarCompression {
    Gzip,
    Xz,
    Plain,
}

fn sniff_compression(archive: &Path) -> ShellResult<TarCompression> {
    let mut head = [0u8; 6];
    let mut file = File::open(archive).map_err(|e| ShellError::from_io(e, archive))?;
    let mut filled = 0;
    while filled < head.len() {
        match file.read(&mut head[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(ShellError::from_io(e, archive)),
        }
    }

    let head = &head[..filled];
    if head.is_empty() {
        return Err(ShellError::InvalidArchive(format!(
            "File {} is empty",
            archive.display()
        )));
    }
    Ok(if head.starts_with(GZIP_MAGIC) {
        TarCompression::Gzip
    } else if head.starts_with(XZ_MAGIC) {
        TarCompression::Xz
    } else {
        TarCompression::Plain
    })
}

fn open_tar(archive: &Path, compression: TarCompression) -> ShellResult<tar::Archive<Box<dyn Read>>> {
    let file = BufReader::new(File::open(archive).map_err(|e| ShellError::from_io(e, archive))?);
    let reader: Box<dyn Read> = match compression {
        TarCompression::Gzip => Box::new(GzDecoder::new(file)),
        TarCompression::Xz => Box::new(XzDecoder::new(file)),
        TarCompression::Plain => Box::new(file),
    };
    Ok(tar::Archive::new(reader))
}

/// Entry names of a tar archive; any read failure means the file is not a usable tar.
fn tar_entry_names(archive: &Path, compression: TarCompression) -> ShellResult<Vec<String>> {
    let invalid = |e: io::Error| {
        ShellError::InvalidArchive(format!("File {} is not a tar file: {e}", archive.display()))
    };
    let mut tar = open_tar(archive, compression)?;
    let mut names = Vec::new();
    for entry in tar.entries().map_err(invalid)? {
        let mut entry = entry.map_err(invalid)?;
        let name = entry.path().map_err(invalid)?.to_string_lossy().into_owned();
        io::copy(&mut entry, &mut io::sink()).map_err(invalid)?;
        names.push(name);
    }
    Ok(names)
}

pub fn extract_tar(archive: &Path, dest: &Path, logger: &dyn Logger) -> ShellResult<Vec<String>> {
    require_exists(archive, "File")?;
    let compression = sniff_compression(archive)?;
    let names = tar_entry_names(archive, compression)?;

    fs::create_dir_all(dest).map_err(|e| ShellError::from_io(e, dest))?;
    logger.command(&format!("Extracting {}", archive.display()));

    let mut tar = open_tar(archive, compression)?;
    tar.unpack(dest)
        .map_err(|e| ShellError::archive("Failed to extract tar", e))?;
    for name in &names {
        logger.success(&format!("Extracted {name}"));
    }
    logger.success(&format!("Extracted {}", archive.display()));
    Ok(names)
}
