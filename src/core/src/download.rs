use std::collections::BTreeMap;
use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::Result;

pub const SIGNATURE_MIME: &str = "text/plain";
pub const ARCHIVE_MIME: &str = "application/zip";
pub const DEFAULT_ARCHIVE_NAME: &str = "sketches.zip";

/// A file ready to be handed to the host's download mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub mime: &'static str,
    pub content: Vec<u8>,
}

/// Name a signature after its input: the last extension is replaced by
/// `.sig`, so `sample.fasta.gz` becomes `sample.fasta.sig`.
pub fn signature_filename(filename: &str) -> String {
    let stem = match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => filename,
    };
    format!("{}.sig", stem)
}

impl Download {
    pub fn signature(filename: &str, signature: &str) -> Download {
        Download {
            filename: signature_filename(filename),
            mime: SIGNATURE_MIME,
            content: signature.as_bytes().to_vec(),
        }
    }
}

/// Bundle `(input filename, signature)` pairs into a zip archive, one
/// `<basename>.sig` entry each. Inputs that map to the same entry name
/// overwrite each other, the last one wins.
pub fn build_archive<'a, I>(signatures: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut entries: BTreeMap<String, (&str, &str)> = BTreeMap::new();
    for (filename, signature) in signatures {
        let entry = signature_filename(filename);
        if let Some((previous, _)) = entries.insert(entry.clone(), (filename, signature)) {
            log::warn!(
                "{} and {} both map to {}, keeping {}",
                previous,
                filename,
                entry,
                filename
            );
        }
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (entry, (_, signature)) in entries {
        log::debug!("adding {} to archive", entry);
        zip.start_file(entry, options)?;
        zip.write_all(signature.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Read;

    #[test]
    fn strips_last_extension() {
        assert_eq!(signature_filename("sampleA.fasta"), "sampleA.sig");
        assert_eq!(signature_filename("reads.fq.gz"), "reads.fq.sig");
        assert_eq!(signature_filename("a.b.c.fa"), "a.b.c.sig");
    }

    #[test]
    fn names_without_extension_are_kept() {
        assert_eq!(signature_filename("genome"), "genome.sig");
        assert_eq!(signature_filename(".hidden"), ".hidden.sig");
    }

    #[test]
    fn single_signature_download() {
        let dl = Download::signature("x.fq", "SIG");
        assert_eq!(dl.filename, "x.sig");
        assert_eq!(dl.mime, "text/plain");
        assert_eq!(dl.content, b"SIG");
    }

    #[test]
    fn archive_entries() {
        let buf = build_archive(vec![("a.fa", "AAA"), ("b.fastq.gz", "BBB")]).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(buf)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut content = String::new();
        archive
            .by_name("b.fastq.sig")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "BBB");
    }

    #[test]
    fn colliding_entries_keep_the_last() {
        let buf = build_archive(vec![("s.fa", "A"), ("s.fq", "B"), ("t.fa", "T")]).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(buf)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut content = String::new();
        archive
            .by_name("s.sig")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "B");
    }

    #[test]
    fn empty_archive_is_valid() {
        let buf = build_archive(Vec::new()).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(buf)).unwrap();
        assert_eq!(archive.len(), 0);
    }
}
