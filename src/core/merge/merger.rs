//! Presentation merger
//!
//! Combines the single-page decks in a run directory into one presentation.
//! Files are consumed in filename order (zero-padded page numbers make that
//! page order). Each slide is copied in two phases: non-picture shapes are
//! cloned verbatim at the element level, and pictures are re-materialized
//! from raw image bytes because a cloned shape element alone does not carry
//! its image across packages.
//!
//! Any unreadable or invalid source file aborts the whole merge; no partial
//! output is produced.

use crate::core::merge::package::{
    DeckBuilder, MergedSlide, Picture, SourceDeck, SourceSlide, Transform,
};
use crate::domain::{EaselError, MergeError, Result};
use quick_xml::events::Event;
use quick_xml::name::QName;
use quick_xml::Reader;
use std::path::{Path, PathBuf};

/// Outcome of a merge
#[derive(Debug, Clone, Copy)]
pub struct MergeReport {
    /// Number of source files consumed
    pub files_merged: usize,
    /// Number of slides in the output deck
    pub slides_merged: usize,
}

/// Merge all `.pptx` files in `directory` into one deck at `output`
///
/// # Errors
///
/// Returns an export error when the directory holds no presentation files
/// and a merge error when any source file cannot be read or parsed.
pub fn merge_presentations(directory: &Path, output: &Path) -> Result<MergeReport> {
    let mut sources: Vec<PathBuf> = std::fs::read_dir(directory)
        .map_err(|e| EaselError::Io(format!("{}: {e}", directory.display())))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pptx"))
        })
        .collect();
    sources.sort_by_key(|path| path.file_name().map(|name| name.to_owned()));

    if sources.is_empty() {
        return Err(EaselError::Export(format!(
            "no presentation files found in {}",
            directory.display()
        )));
    }

    tracing::info!(count = sources.len(), "Merging presentation files");

    let mut builder = DeckBuilder::new();
    for path in &sources {
        let mut deck = SourceDeck::open(path)?;
        tracing::debug!(
            file = %path.display(),
            slides = deck.slide_count(),
            "Adding file to merged deck"
        );
        for index in 0..deck.slide_count() {
            let slide = deck.slide(index)?;
            let merged = copy_slide(&mut deck, &slide)?;
            builder.add_slide(merged);
        }
    }

    builder.save(output)?;

    tracing::info!(
        slides = builder.slide_count(),
        output = %output.display(),
        "Merged presentation written"
    );

    Ok(MergeReport {
        files_merged: sources.len(),
        slides_merged: builder.slide_count(),
    })
}

/// Copy one source slide into the merged representation
///
/// Phase one clones every non-picture shape element verbatim. Phase two
/// re-materializes each top-level picture from its media part, keeping the
/// original position and size.
fn copy_slide(deck: &mut SourceDeck, slide: &SourceSlide) -> Result<MergedSlide> {
    let children =
        sp_tree_children(&slide.xml).map_err(|message| MergeError::MalformedSlide {
            path: deck.path().to_string(),
            message,
        })?;

    let mut merged = MergedSlide {
        namespaces: slide.namespaces.clone(),
        ..Default::default()
    };

    for child in children {
        match child.local.as_slice() {
            // The shape-tree group header carries nothing to copy, and the
            // merged slide gets a fresh extension list.
            b"nvGrpSpPr" | b"grpSpPr" | b"extLst" => {}
            b"pic" => {
                let picture = extract_picture(deck, slide, child.raw)?;
                merged.pictures.push(picture);
            }
            _ => merged.shapes_xml.push(child.raw.to_vec()),
        }
    }

    Ok(merged)
}

/// Re-materialize one picture shape from its source package
fn extract_picture(
    deck: &mut SourceDeck,
    slide: &SourceSlide,
    raw: &[u8],
) -> Result<Picture> {
    let parts = parse_picture(raw).map_err(|message| MergeError::MalformedSlide {
        path: deck.path().to_string(),
        message,
    })?;

    let rel = slide.rels.get(&parts.embed_id).ok_or_else(|| {
        MergeError::InvalidPackage {
            path: deck.path().to_string(),
            message: format!(
                "picture references undeclared relationship {}",
                parts.embed_id
            ),
        }
    })?;
    if !rel.is_image() {
        return Err(MergeError::InvalidPackage {
            path: deck.path().to_string(),
            message: format!("relationship {} is not an image", parts.embed_id),
        }
        .into());
    }

    let bytes = deck.media(&slide.part_name, &rel.target)?;
    let extension = rel
        .target
        .rsplit('.')
        .next()
        .filter(|ext| !ext.is_empty() && !ext.contains('/'))
        .unwrap_or("bin")
        .to_string();

    Ok(Picture {
        bytes,
        extension,
        transform: parts.transform,
    })
}

/// One direct child element of a slide's shape tree
struct SpTreeChild<'a> {
    /// Verbatim bytes of the whole element
    raw: &'a [u8],
    /// Local (prefix-stripped) element name
    local: Vec<u8>,
}

/// Slice the direct children of `p:spTree` out of a slide document
fn sp_tree_children(xml: &[u8]) -> std::result::Result<Vec<SpTreeChild<'_>>, String> {
    let mut reader = Reader::from_reader(xml);
    let mut children = Vec::new();
    let mut inside = false;

    loop {
        let start_pos = reader.buffer_position() as usize;
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) => {
                let local = e.local_name().as_ref().to_vec();
                if !inside {
                    if local == b"spTree" {
                        inside = true;
                    }
                    continue;
                }
                // Consume to the matching end tag so the raw slice spans
                // the entire element, nested content included.
                let name = e.name().as_ref().to_vec();
                reader
                    .read_to_end(QName(&name))
                    .map_err(|e| e.to_string())?;
                let end_pos = reader.buffer_position() as usize;
                children.push(SpTreeChild {
                    raw: &xml[start_pos..end_pos],
                    local,
                });
            }
            Event::Empty(e) => {
                if inside {
                    let end_pos = reader.buffer_position() as usize;
                    children.push(SpTreeChild {
                        raw: &xml[start_pos..end_pos],
                        local: e.local_name().as_ref().to_vec(),
                    });
                }
            }
            Event::End(e) => {
                if inside && e.local_name().as_ref() == b"spTree" {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(children)
}

/// Embed id and transform parsed out of one `p:pic` element
struct PictureParts {
    embed_id: String,
    transform: Option<Transform>,
}

/// Parse the image reference and placement of a picture shape
fn parse_picture(raw: &[u8]) -> std::result::Result<PictureParts, String> {
    let mut reader = Reader::from_reader(raw);
    let mut embed_id = None;
    let mut offset: Option<(i64, i64)> = None;
    let mut extent: Option<(i64, i64)> = None;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"blip" if embed_id.is_none() => {
                    for attr in e.attributes() {
                        let attr = attr.map_err(|e| e.to_string())?;
                        if attr.key.as_ref().ends_with(b":embed") {
                            embed_id = Some(
                                attr.unescape_value()
                                    .map_err(|e| e.to_string())?
                                    .into_owned(),
                            );
                        }
                    }
                }
                b"off" if offset.is_none() => {
                    offset = Some(parse_point(&e, b"x", b"y")?);
                }
                b"ext" if extent.is_none() => {
                    extent = Some(parse_point(&e, b"cx", b"cy")?);
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    let embed_id = embed_id.ok_or("picture shape carries no embedded image")?;
    let transform = match (offset, extent) {
        (Some((x, y)), Some((cx, cy))) => Some(Transform { x, y, cx, cy }),
        _ => None,
    };

    Ok(PictureParts {
        embed_id,
        transform,
    })
}

/// Read a pair of integer attributes off an element
fn parse_point(
    element: &quick_xml::events::BytesStart<'_>,
    first: &[u8],
    second: &[u8],
) -> std::result::Result<(i64, i64), String> {
    let mut a = None;
    let mut b = None;
    for attr in element.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        if attr.key.as_ref() == first {
            a = Some(value.parse::<i64>().map_err(|e| e.to_string())?);
        } else if attr.key.as_ref() == second {
            b = Some(value.parse::<i64>().map_err(|e| e.to_string())?);
        }
    }
    match (a, b) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err("transform element is missing coordinates".to_string()),
    }
}
