use std::io::Cursor;

use futures::future::join_all;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

// US Letter, points.
const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 54.0;

/// Every photo renders as one full-width block at this width; height follows
/// the source aspect ratio.
const MAX_PHOTO_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const PHOTO_GAP: f32 = 18.0;

const HEADER_FONT_SIZE: f32 = 20.0;
const HEADER_GAP: f32 = 16.0;
const PLACEHOLDER_FONT_SIZE: f32 = 12.0;

const PLACEHOLDER_TEXT: &str = "No photographs were uploaded for this job.";

#[derive(Debug, thiserror::Error)]
pub enum ReportRenderError {
    #[error("job has no address to render a report for")]
    EmptyAddress,

    #[error("pdf assembly failed: {0}")]
    Assembly(#[from] lopdf::Error),

    #[error("pdf serialization failed: {0}")]
    Serialize(#[from] std::io::Error),
}

/// A photo decoded for embedding: intrinsic dimensions plus an RGB JPEG
/// re-encode suitable for a DCTDecode image stream.
pub struct PhotoImage {
    pub width: u32,
    pub height: u32,
    jpeg: Vec<u8>,
}

impl PhotoImage {
    /// Decode arbitrary image bytes (JPEG/PNG/WebP). `None` when the bytes
    /// don't decode; callers skip the photo and keep going.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let decoded = image::load_from_memory(bytes).ok()?;
        let (width, height) = (decoded.width(), decoded.height());

        let mut jpeg = Vec::new();
        image::DynamicImage::ImageRgb8(decoded.to_rgb8())
            .write_to(&mut Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
            .ok()?;

        Some(Self { width, height, jpeg })
    }

    pub fn jpeg_bytes(&self) -> &[u8] {
        &self.jpeg
    }

    /// Rendered block height: full width, aspect ratio preserved.
    pub fn scaled_height(&self) -> f32 {
        MAX_PHOTO_WIDTH * self.height as f32 / self.width as f32
    }
}

/// Fetch photos over HTTP in input order. Fetches run concurrently but the
/// returned sequence always follows `urls`; a transport error, non-2xx
/// response, or undecodable body drops that photo and never fails the batch.
pub async fn fetch_photos(client: &reqwest::Client, urls: &[String]) -> Vec<PhotoImage> {
    let fetches = urls.iter().map(|url| fetch_photo(client, url));
    join_all(fetches).await.into_iter().flatten().collect()
}

async fn fetch_photo(client: &reqwest::Client, url: &str) -> Option<PhotoImage> {
    let response = match client.get(url).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Photo fetch failed, skipping");
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::warn!(url = %url, status = %response.status(), "Photo fetch returned non-success, skipping");
        return None;
    }

    let bytes = match response.bytes().await {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Photo body read failed, skipping");
            return None;
        }
    };

    let photo = PhotoImage::from_bytes(&bytes);
    if photo.is_none() {
        tracing::warn!(url = %url, "Photo bytes did not decode as an image, skipping");
    }
    photo
}

struct PageDraft {
    operations: Vec<Operation>,
    xobjects: Vec<(String, ObjectId)>,
    photos_placed: usize,
}

impl PageDraft {
    fn new() -> Self {
        Self {
            operations: Vec::new(),
            xobjects: Vec::new(),
            photos_placed: 0,
        }
    }
}

fn text_ops(font: &str, size: f32, x: f32, y: f32, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.into(), size.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

/// Render the job report: a bold address header followed by one full-width
/// block per photo, reflowing onto as many pages as the photos need. Zero
/// photos renders a single italic placeholder line. Individual photo
/// problems were already filtered out by [`fetch_photos`]; this fails only
/// when document assembly itself fails.
pub fn render_report(address: &str, photos: &[PhotoImage]) -> Result<Vec<u8>, ReportRenderError> {
    if address.trim().is_empty() {
        return Err(ReportRenderError::EmptyAddress);
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let bold_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let italic_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Oblique",
    });

    let mut finished_pages: Vec<PageDraft> = Vec::new();
    let mut page = PageDraft::new();
    let mut y = PAGE_HEIGHT - MARGIN;

    // Header only on the first page.
    y -= HEADER_FONT_SIZE;
    page.operations
        .extend(text_ops("F1", HEADER_FONT_SIZE, MARGIN, y, address));
    y -= HEADER_GAP;

    if photos.is_empty() {
        y -= PLACEHOLDER_FONT_SIZE;
        page.operations.extend(text_ops(
            "F2",
            PLACEHOLDER_FONT_SIZE,
            MARGIN,
            y,
            PLACEHOLDER_TEXT,
        ));
    }

    for (index, photo) in photos.iter().enumerate() {
        let block_height = photo.scaled_height();

        // Start a new page when the block doesn't fit, unless the page holds
        // no photo yet (an oversized photo gets a page to itself and may
        // extend past the bottom margin).
        if y - block_height < MARGIN && page.photos_placed > 0 {
            finished_pages.push(std::mem::replace(&mut page, PageDraft::new()));
            y = PAGE_HEIGHT - MARGIN;
        }

        let image_dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => photo.width as i64,
            "Height" => photo.height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8i64,
            "Filter" => "DCTDecode",
        };
        let image_id =
            doc.add_object(Stream::new(image_dict, photo.jpeg.clone()).with_compression(false));

        let name = format!("Im{index}");
        let bottom = y - block_height;
        page.operations.push(Operation::new("q", vec![]));
        page.operations.push(Operation::new(
            "cm",
            vec![
                MAX_PHOTO_WIDTH.into(),
                0f32.into(),
                0f32.into(),
                block_height.into(),
                MARGIN.into(),
                bottom.into(),
            ],
        ));
        page.operations
            .push(Operation::new("Do", vec![Object::Name(name.clone().into_bytes())]));
        page.operations.push(Operation::new("Q", vec![]));

        page.xobjects.push((name, image_id));
        page.photos_placed += 1;
        y = bottom - PHOTO_GAP;
    }

    finished_pages.push(page);

    let mut page_ids: Vec<ObjectId> = Vec::new();
    for draft in finished_pages {
        let content = Content {
            operations: draft.operations,
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let mut xobject_dict = Dictionary::new();
        for (name, id) in draft.xobjects {
            xobject_dict.set(name.into_bytes(), id);
        }

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0f32.into(), 0f32.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Resources" => dictionary! {
                "Font" => dictionary! {
                    "F1" => bold_font_id,
                    "F2" => italic_font_id,
                },
                "XObject" => xobject_dict,
            },
        });
        page_ids.push(page_id);
    }

    let kids: Vec<Object> = page_ids.iter().map(|id| (*id).into()).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_ids.len() as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Cursor::new(Vec::new());
    doc.save_to(&mut buffer)?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn solid_jpeg(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb(color));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
            .unwrap();
        bytes
    }

    fn photo(width: u32, height: u32, color: [u8; 3]) -> PhotoImage {
        PhotoImage::from_bytes(&solid_jpeg(width, height, color)).unwrap()
    }

    fn image_streams_in_page_order(doc: &Document) -> Vec<Vec<u8>> {
        let mut streams = Vec::new();
        for (_, page_id) in doc.get_pages() {
            let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
            let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
            let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
            for (_, value) in xobjects.iter() {
                let id = value.as_reference().unwrap();
                let stream = doc.get_object(id).unwrap().as_stream().unwrap();
                streams.push(stream.content.clone());
            }
        }
        streams
    }

    #[test]
    fn test_scaled_height_preserves_aspect_ratio() {
        let p = photo(800, 600, [10, 20, 30]);
        assert!((p.scaled_height() - MAX_PHOTO_WIDTH * 0.75).abs() < 0.01);
    }

    #[test]
    fn test_render_rejects_empty_address() {
        let err = render_report("   ", &[]).unwrap_err();
        assert!(matches!(err, ReportRenderError::EmptyAddress));
    }

    #[test]
    fn test_render_without_photos_has_placeholder() {
        let bytes = render_report("742 Evergreen Terrace", &[]).unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);

        let text = doc.extract_text(&[1]).unwrap();
        assert!(text.contains("Evergreen"), "header missing: {text}");
        assert!(text.contains("No photographs"), "placeholder missing: {text}");
        assert!(image_streams_in_page_order(&doc).is_empty());
    }

    #[test]
    fn test_render_embeds_photos_in_input_order() {
        let red = photo(400, 300, [200, 0, 0]);
        let blue = photo(400, 300, [0, 0, 200]);
        let expected = vec![red.jpeg_bytes().to_vec(), blue.jpeg_bytes().to_vec()];

        let bytes = render_report("123 Main St", &[red, blue]).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();

        assert_eq!(image_streams_in_page_order(&doc), expected);
    }

    #[test]
    fn test_render_reflows_across_pages() {
        // Each block is 504pt wide and 378pt tall; two fit nowhere on one
        // page below a header, so three photos need at least two pages.
        let photos = vec![
            photo(400, 300, [1, 2, 3]),
            photo(400, 300, [4, 5, 6]),
            photo(400, 300, [7, 8, 9]),
        ];

        let bytes = render_report("123 Main St", &photos).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();

        assert!(doc.get_pages().len() >= 2);
        assert_eq!(image_streams_in_page_order(&doc).len(), 3);
    }

    #[test]
    fn test_oversized_photo_gets_its_own_page() {
        // 100x800 scales to 4032pt tall, far past one page.
        let photos = vec![photo(100, 800, [9, 9, 9]), photo(100, 800, [8, 8, 8])];

        let bytes = render_report("123 Main St", &photos).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();

        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_photo_image_rejects_garbage() {
        assert!(PhotoImage::from_bytes(b"definitely not an image").is_none());
    }
}
