//! OOXML package serialization.

use std::io::{Cursor, Write};

use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use mdocx_diagrams::RenderedImage;

use crate::error::DocxError;
use crate::section::{AssembledDocument, Section};
use crate::xml;

impl AssembledDocument {
    /// Serialize to DOCX bytes.
    ///
    /// The package carries fixed entry timestamps and a fixed part order,
    /// so repeated serialization of the same document is byte-identical.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocxError> {
        let images: Vec<&RenderedImage> = self
            .sections
            .iter()
            .filter_map(|s| match s {
                Section::Image(image) => Some(image),
                _ => None,
            })
            .collect();

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        let put = |writer: &mut ZipWriter<Cursor<Vec<u8>>>,
                   name: &str,
                   data: &[u8]|
         -> Result<(), DocxError> {
            // Fixed timestamp keeps serialization byte-identical.
            let options = SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .last_modified_time(zip::DateTime::default());
            writer.start_file(name, options)?;
            writer.write_all(data)?;
            Ok(())
        };

        put(
            &mut writer,
            "[Content_Types].xml",
            xml::CONTENT_TYPES_XML.as_bytes(),
        )?;
        put(&mut writer, "_rels/.rels", xml::ROOT_RELS_XML.as_bytes())?;
        put(
            &mut writer,
            "word/document.xml",
            xml::document_xml(self).as_bytes(),
        )?;
        put(&mut writer, "word/styles.xml", xml::styles_xml().as_bytes())?;
        put(
            &mut writer,
            "word/_rels/document.xml.rels",
            xml::document_rels_xml(images.len()).as_bytes(),
        )?;
        for (n, image) in images.iter().enumerate() {
            put(
                &mut writer,
                &format!("word/media/image{}.png", n + 1),
                &image.bytes,
            )?;
        }

        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }
}
