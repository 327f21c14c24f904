//! Presentation package I/O
//!
//! `SourceDeck` reads a `.pptx` package: slide parts in the order declared
//! by `presentation.xml`, per-slide relationships, and referenced media
//! bytes. `DeckBuilder` writes the merged package over the embedded
//! skeleton (see `template`), re-embedding every picture as a fresh media
//! part. Slide content travels between the two as raw XML plus extracted
//! picture payloads, never as shared parts.

use crate::core::merge::template::{
    image_content_type, NS_DRAWING, NS_PRESENTATION, NS_RELATIONSHIPS, ROOT_RELS,
    SLIDE_HEIGHT_EMU, SLIDE_LAYOUT_RELS, SLIDE_LAYOUT_XML, SLIDE_MASTER_RELS, SLIDE_MASTER_XML,
    SLIDE_WIDTH_EMU, THEME_XML,
};
use crate::domain::MergeError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// One relationship entry of a part
#[derive(Debug, Clone)]
pub struct Relationship {
    /// Relationship type URI
    pub rel_type: String,
    /// Target path, relative to the owning part's directory
    pub target: String,
}

impl Relationship {
    /// Whether this relationship points at an image part
    pub fn is_image(&self) -> bool {
        self.rel_type.ends_with("/image")
    }
}

/// One slide read out of a source package
#[derive(Debug)]
pub struct SourceSlide {
    /// Part name, e.g. `ppt/slides/slide1.xml`
    pub part_name: String,
    /// Raw slide XML
    pub xml: Vec<u8>,
    /// Relationships of the slide part, keyed by id
    pub rels: HashMap<String, Relationship>,
    /// Namespace declarations on the slide's root element
    pub namespaces: Vec<(String, String)>,
}

/// Reader over one source `.pptx` package
pub struct SourceDeck {
    path: String,
    archive: ZipArchive<BufReader<File>>,
    slide_parts: Vec<String>,
}

impl SourceDeck {
    /// Open a package and resolve its slide parts in declared order
    ///
    /// # Errors
    ///
    /// Returns an unreadable-source error if the file is not a zip archive
    /// and an invalid-package error if the presentation parts are missing
    /// or malformed.
    pub fn open(path: &Path) -> Result<Self, MergeError> {
        let display = path.display().to_string();

        let file = File::open(path).map_err(|e| MergeError::UnreadableSource {
            path: display.clone(),
            message: e.to_string(),
        })?;
        let mut archive =
            ZipArchive::new(BufReader::new(file)).map_err(|e| MergeError::UnreadableSource {
                path: display.clone(),
                message: e.to_string(),
            })?;

        let rels_xml = read_part(&mut archive, &display, "ppt/_rels/presentation.xml.rels")?;
        let rels = parse_relationships(&rels_xml).map_err(|message| {
            MergeError::InvalidPackage {
                path: display.clone(),
                message,
            }
        })?;

        let presentation_xml = read_part(&mut archive, &display, "ppt/presentation.xml")?;
        let slide_rel_ids = parse_slide_rel_ids(&presentation_xml).map_err(|message| {
            MergeError::InvalidPackage {
                path: display.clone(),
                message,
            }
        })?;

        let slide_parts = slide_rel_ids
            .iter()
            .map(|rid| {
                rels.get(rid)
                    .map(|rel| resolve_target("ppt", &rel.target))
                    .ok_or_else(|| MergeError::InvalidPackage {
                        path: display.clone(),
                        message: format!("slide relationship {rid} is not declared"),
                    })
            })
            .collect::<Result<Vec<String>, MergeError>>()?;

        Ok(Self {
            path: display,
            archive,
            slide_parts,
        })
    }

    /// Path of the package, for error messages and logging
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Number of slides the package declares
    pub fn slide_count(&self) -> usize {
        self.slide_parts.len()
    }

    /// Read one slide (XML, relationships, root namespaces)
    pub fn slide(&mut self, index: usize) -> Result<SourceSlide, MergeError> {
        let part_name = self.slide_parts[index].clone();
        let xml = read_part(&mut self.archive, &self.path, &part_name)?;

        let rels_part = rels_part_for(&part_name);
        let rels = match try_read_part(&mut self.archive, &self.path, &rels_part)? {
            Some(bytes) => {
                parse_relationships(&bytes).map_err(|message| MergeError::InvalidPackage {
                    path: self.path.clone(),
                    message,
                })?
            }
            None => HashMap::new(),
        };

        let namespaces =
            parse_root_namespaces(&xml).map_err(|message| MergeError::MalformedSlide {
                path: self.path.clone(),
                message,
            })?;

        Ok(SourceSlide {
            part_name,
            xml,
            rels,
            namespaces,
        })
    }

    /// Read the media part a slide relationship points at
    pub fn media(&mut self, slide_part: &str, target: &str) -> Result<Vec<u8>, MergeError> {
        let base = parent_dir(slide_part);
        let part = resolve_target(base, target);
        read_part(&mut self.archive, &self.path, &part)
    }
}

/// Picture position and size in EMU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transform {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

/// One re-materialized picture
#[derive(Debug, Clone)]
pub struct Picture {
    /// Raw image bytes extracted from the source package
    pub bytes: Vec<u8>,
    /// File extension of the source media part (drives the content type)
    pub extension: String,
    /// Position and size of the original shape, when it declared one
    pub transform: Option<Transform>,
}

/// One slide prepared for the merged output
#[derive(Debug, Clone, Default)]
pub struct MergedSlide {
    /// Verbatim-cloned non-picture shape elements, in source order
    pub shapes_xml: Vec<Vec<u8>>,
    /// Re-materialized pictures, appended after the cloned shapes
    pub pictures: Vec<Picture>,
    /// Extra namespace declarations needed by the cloned elements
    pub namespaces: Vec<(String, String)>,
}

/// Writer for the merged presentation package
#[derive(Default)]
pub struct DeckBuilder {
    slides: Vec<MergedSlide>,
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one slide to the output deck
    pub fn add_slide(&mut self, slide: MergedSlide) {
        self.slides.push(slide);
    }

    /// Number of slides accumulated so far
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Write the merged package
    ///
    /// The whole package is produced in one pass; if anything fails, no
    /// partial file is left behind beyond what the filesystem already
    /// created for the zip being written.
    pub fn save(&self, output: &Path) -> Result<(), MergeError> {
        let file = File::create(output)
            .map_err(|e| MergeError::WriteFailed(format!("{}: {e}", output.display())))?;
        let mut zip = ZipWriter::new(BufWriter::new(file));

        let mut write = |name: &str, bytes: &[u8]| -> Result<(), MergeError> {
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            zip.start_file(name, options)
                .map_err(|e| MergeError::WriteFailed(format!("{name}: {e}")))?;
            zip.write_all(bytes)
                .map_err(|e| MergeError::WriteFailed(format!("{name}: {e}")))?;
            Ok(())
        };

        // Media parts get globally numbered names; each slide records the
        // relationship ids its generated picture shapes reference.
        let mut media_parts: Vec<(String, &[u8])> = Vec::new();
        let mut slide_docs: Vec<(String, Vec<(String, String)>)> = Vec::new();
        let mut image_extensions: Vec<String> = Vec::new();

        for slide in &self.slides {
            let mut slide_rels: Vec<(String, String)> = vec![(
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout"
                    .to_string(),
                "../slideLayouts/slideLayout1.xml".to_string(),
            )];

            let mut picture_xml = String::new();
            for (picture_index, picture) in slide.pictures.iter().enumerate() {
                let media_number = media_parts.len() + 1;
                let extension = picture.extension.to_ascii_lowercase();
                let media_name = format!("ppt/media/image{media_number}.{extension}");
                media_parts.push((media_name, &picture.bytes));

                // rId1 is the layout; images follow.
                let rel_id = format!("rId{}", slide_rels.len() + 1);
                slide_rels.push((
                    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image"
                        .to_string(),
                    format!("../media/image{media_number}.{extension}"),
                ));

                if !image_extensions.contains(&extension) {
                    image_extensions.push(extension);
                }

                picture_xml.push_str(&picture_shape_xml(picture, picture_index, &rel_id));
            }

            let doc = slide_document(slide, &picture_xml);
            slide_docs.push((doc, slide_rels));
        }

        write("[Content_Types].xml", self.content_types(&image_extensions).as_bytes())?;
        write("_rels/.rels", ROOT_RELS.as_bytes())?;
        write("ppt/presentation.xml", self.presentation_xml().as_bytes())?;
        write(
            "ppt/_rels/presentation.xml.rels",
            self.presentation_rels().as_bytes(),
        )?;
        write("ppt/slideMasters/slideMaster1.xml", SLIDE_MASTER_XML.as_bytes())?;
        write(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            SLIDE_MASTER_RELS.as_bytes(),
        )?;
        write("ppt/slideLayouts/slideLayout1.xml", SLIDE_LAYOUT_XML.as_bytes())?;
        write(
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            SLIDE_LAYOUT_RELS.as_bytes(),
        )?;
        write("ppt/theme/theme1.xml", THEME_XML.as_bytes())?;

        for (index, (doc, rels)) in slide_docs.iter().enumerate() {
            let number = index + 1;
            write(&format!("ppt/slides/slide{number}.xml"), doc.as_bytes())?;
            write(
                &format!("ppt/slides/_rels/slide{number}.xml.rels"),
                relationships_xml(rels).as_bytes(),
            )?;
        }

        for (name, bytes) in &media_parts {
            write(name, bytes)?;
        }

        let mut inner = zip
            .finish()
            .map_err(|e| MergeError::WriteFailed(e.to_string()))?;
        inner
            .flush()
            .map_err(|e| MergeError::WriteFailed(e.to_string()))?;

        Ok(())
    }

    fn content_types(&self, image_extensions: &[String]) -> String {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
             <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
             <Default Extension=\"xml\" ContentType=\"application/xml\"/>",
        );
        for extension in image_extensions {
            xml.push_str(&format!(
                "<Default Extension=\"{extension}\" ContentType=\"{}\"/>",
                image_content_type(extension)
            ));
        }
        xml.push_str(
            "<Override PartName=\"/ppt/presentation.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml\"/>\
             <Override PartName=\"/ppt/slideMasters/slideMaster1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml\"/>\
             <Override PartName=\"/ppt/slideLayouts/slideLayout1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml\"/>\
             <Override PartName=\"/ppt/theme/theme1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.theme+xml\"/>",
        );
        for number in 1..=self.slides.len() {
            xml.push_str(&format!(
                "<Override PartName=\"/ppt/slides/slide{number}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slide+xml\"/>"
            ));
        }
        xml.push_str("</Types>");
        xml
    }

    fn presentation_xml(&self) -> String {
        let mut xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <p:presentation xmlns:a=\"{NS_DRAWING}\" xmlns:r=\"{NS_RELATIONSHIPS}\" xmlns:p=\"{NS_PRESENTATION}\">\
             <p:sldMasterIdLst><p:sldMasterId id=\"2147483648\" r:id=\"rId1\"/></p:sldMasterIdLst>\
             <p:sldIdLst>"
        );
        for index in 0..self.slides.len() {
            // Slide ids must be >= 256 and unique; relationship rId1 is the master.
            xml.push_str(&format!(
                "<p:sldId id=\"{}\" r:id=\"rId{}\"/>",
                256 + index,
                index + 2
            ));
        }
        xml.push_str(&format!(
            "</p:sldIdLst>\
             <p:sldSz cx=\"{SLIDE_WIDTH_EMU}\" cy=\"{SLIDE_HEIGHT_EMU}\"/>\
             <p:notesSz cx=\"6858000\" cy=\"9144000\"/>\
             </p:presentation>"
        ));
        xml
    }

    fn presentation_rels(&self) -> String {
        let mut rels: Vec<(String, String)> = vec![(
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster"
                .to_string(),
            "slideMasters/slideMaster1.xml".to_string(),
        )];
        for number in 1..=self.slides.len() {
            rels.push((
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide"
                    .to_string(),
                format!("slides/slide{number}.xml"),
            ));
        }
        relationships_xml(&rels)
    }
}

/// Serialize a relationships part from (type, target) pairs; ids are
/// assigned positionally as rId1, rId2, …
fn relationships_xml(rels: &[(String, String)]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    );
    for (index, (rel_type, target)) in rels.iter().enumerate() {
        xml.push_str(&format!(
            "<Relationship Id=\"rId{}\" Type=\"{rel_type}\" Target=\"{target}\"/>",
            index + 1
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

/// Generate the slide document for one merged slide
fn slide_document(slide: &MergedSlide, picture_xml: &str) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <p:sld xmlns:a=\"{NS_DRAWING}\" xmlns:r=\"{NS_RELATIONSHIPS}\" xmlns:p=\"{NS_PRESENTATION}\""
    );
    // Carry any extra namespace declarations the cloned elements rely on
    // (markup-compatibility, chart, vendor extensions, …).
    for (name, uri) in &slide.namespaces {
        if matches!(name.as_str(), "xmlns:a" | "xmlns:r" | "xmlns:p") {
            continue;
        }
        xml.push_str(&format!(" {name}=\"{uri}\""));
    }
    xml.push_str(
        "><p:cSld><p:spTree>\
         <p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>\
         <p:grpSpPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"0\" cy=\"0\"/>\
         <a:chOff x=\"0\" y=\"0\"/><a:chExt cx=\"0\" cy=\"0\"/></a:xfrm></p:grpSpPr>",
    );
    for shape in &slide.shapes_xml {
        xml.push_str(&String::from_utf8_lossy(shape));
    }
    xml.push_str(picture_xml);
    xml.push_str(
        "</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>",
    );
    xml
}

/// Generate a fresh picture shape referencing a re-embedded media part
fn picture_shape_xml(picture: &Picture, picture_index: usize, rel_id: &str) -> String {
    // High shape-id base keeps generated ids clear of ids carried by the
    // verbatim-cloned shapes on the same slide.
    let shape_id = 10_000 + picture_index;
    let transform = picture
        .transform
        .map(|t| {
            format!(
                "<a:xfrm><a:off x=\"{}\" y=\"{}\"/><a:ext cx=\"{}\" cy=\"{}\"/></a:xfrm>",
                t.x, t.y, t.cx, t.cy
            )
        })
        .unwrap_or_default();

    format!(
        "<p:pic><p:nvPicPr>\
         <p:cNvPr id=\"{shape_id}\" name=\"Picture {}\"/>\
         <p:cNvPicPr><a:picLocks noChangeAspect=\"1\"/></p:cNvPicPr><p:nvPr/>\
         </p:nvPicPr>\
         <p:blipFill><a:blip r:embed=\"{rel_id}\"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>\
         <p:spPr>{transform}<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></p:spPr>\
         </p:pic>",
        picture_index + 1
    )
}

/// Read one part out of the archive
fn read_part(
    archive: &mut ZipArchive<BufReader<File>>,
    path: &str,
    name: &str,
) -> Result<Vec<u8>, MergeError> {
    try_read_part(archive, path, name)?.ok_or_else(|| MergeError::InvalidPackage {
        path: path.to_string(),
        message: format!("missing part {name}"),
    })
}

/// Read one part, returning None when it does not exist
fn try_read_part(
    archive: &mut ZipArchive<BufReader<File>>,
    path: &str,
    name: &str,
) -> Result<Option<Vec<u8>>, MergeError> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => {
            return Err(MergeError::InvalidPackage {
                path: path.to_string(),
                message: format!("{name}: {e}"),
            })
        }
    };

    let mut bytes = Vec::with_capacity(entry.size() as usize);
    entry
        .read_to_end(&mut bytes)
        .map_err(|e| MergeError::InvalidPackage {
            path: path.to_string(),
            message: format!("{name}: {e}"),
        })?;
    Ok(Some(bytes))
}

/// Parse a relationships part into an id-keyed map
fn parse_relationships(xml: &[u8]) -> Result<HashMap<String, Relationship>, String> {
    let mut reader = Reader::from_reader(xml);
    let mut rels = HashMap::new();

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) | Event::Empty(e) => {
                if e.local_name().as_ref() != b"Relationship" {
                    continue;
                }
                let mut id = None;
                let mut rel_type = None;
                let mut target = None;
                for attr in e.attributes() {
                    let attr = attr.map_err(|e| e.to_string())?;
                    let value = attr
                        .unescape_value()
                        .map_err(|e| e.to_string())?
                        .into_owned();
                    match attr.key.as_ref() {
                        b"Id" => id = Some(value),
                        b"Type" => rel_type = Some(value),
                        b"Target" => target = Some(value),
                        _ => {}
                    }
                }
                if let (Some(id), Some(rel_type), Some(target)) = (id, rel_type, target) {
                    rels.insert(id, Relationship { rel_type, target });
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rels)
}

/// Extract the ordered slide relationship ids from presentation.xml
fn parse_slide_rel_ids(xml: &[u8]) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_reader(xml);
    let mut ids = Vec::new();
    let mut in_slide_list = false;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) if e.local_name().as_ref() == b"sldIdLst" => {
                in_slide_list = true;
            }
            Event::End(e) if e.local_name().as_ref() == b"sldIdLst" => {
                in_slide_list = false;
            }
            Event::Start(e) | Event::Empty(e) => {
                if !in_slide_list || e.local_name().as_ref() != b"sldId" {
                    continue;
                }
                for attr in e.attributes() {
                    let attr = attr.map_err(|e| e.to_string())?;
                    if attr.key.as_ref().ends_with(b":id") {
                        ids.push(
                            attr.unescape_value()
                                .map_err(|e| e.to_string())?
                                .into_owned(),
                        );
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if ids.is_empty() {
        return Err("presentation declares no slides".to_string());
    }
    Ok(ids)
}

/// Collect the namespace declarations on a document's root element
fn parse_root_namespaces(xml: &[u8]) -> Result<Vec<(String, String)>, String> {
    let mut reader = Reader::from_reader(xml);
    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) | Event::Empty(e) => {
                let mut namespaces = Vec::new();
                for attr in e.attributes() {
                    let attr = attr.map_err(|e| e.to_string())?;
                    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                    if key == "xmlns" || key.starts_with("xmlns:") {
                        namespaces.push((
                            key,
                            attr.unescape_value()
                                .map_err(|e| e.to_string())?
                                .into_owned(),
                        ));
                    }
                }
                return Ok(namespaces);
            }
            Event::Eof => return Err("slide document has no root element".to_string()),
            _ => {}
        }
    }
}

/// Relationships part name for a given part
fn rels_part_for(part_name: &str) -> String {
    match part_name.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part_name}.rels"),
    }
}

/// Directory of a part name
fn parent_dir(part_name: &str) -> &str {
    part_name.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Resolve a relationship target against a base directory
///
/// Targets use forward slashes and may climb with `..` (e.g.
/// `../media/image1.png` relative to `ppt/slides`).
fn resolve_target(base: &str, target: &str) -> String {
    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
