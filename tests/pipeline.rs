use bl_extract::error::AcquisitionError;
use bl_extract::ocr::MockOcrEngine;
use bl_extract::pdf_extract::{NativePdf, PdfTextSource};
use bl_extract::{Acquirer, AcquisitionMethod, ExtractedBlData, Pipeline};
use bl_extract::config::ExtractionConfig;
use lopdf::{Document, Object, Stream, dictionary};
use std::sync::Arc;

/// Text source that returns a fixed transcript and one fake page image.
struct FixedText(&'static str);

impl PdfTextSource for FixedText {
    fn extract_text(&self, _pdf_bytes: &[u8]) -> Result<String, AcquisitionError> {
        Ok(self.0.to_string())
    }

    fn page_images(&self, _pdf_bytes: &[u8]) -> Result<Vec<Vec<u8>>, AcquisitionError> {
        Ok(vec![vec![0xFF, 0xD8, 0xFF]])
    }
}

fn pipeline(pdf: Arc<dyn PdfTextSource>, ocr: Arc<MockOcrEngine>) -> Pipeline {
    Pipeline::new(Acquirer::new(pdf, ocr, 50), ExtractionConfig::default())
}

/// One page whose only content is a JPEG image XObject.
fn scanned_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 1,
            "Height" => 1,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        vec![0xFF, 0xD8, 0xFF, 0xD9],
    ));
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        b"q 612 0 0 792 0 0 cm /Im1 Do Q".to_vec(),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Resources" => dictionary! { "XObject" => dictionary! { "Im1" => image_id } },
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

const OCR_TRANSCRIPT: &str = "\
CONNAISSEMENT N° GRIU1234567
EXPEDITEUR:
ISTANBUL GIDA SAN. A.S.
ISTANBUL, TURKIYE
DESTINATAIRE:
ETS BAH ET FRERES
MARCHE MADINA, CONAKRY
NAVIRE : GRANDE TEMA
PORT DE CHARGEMENT : MERSIN
PORT DE DÉCHARGEMENT : CONAKRI
200 CARTONS DE BISCUITS
POIDS BRUT : 4.250,00 KG
CONTENEUR GRIU7654321 TGHU1234560 SCELLE: TR-88812 1 X 20' DRY
";

#[test]
fn whitespace_only_text_layer_switches_to_ocr() {
    let ocr = Arc::new(MockOcrEngine::returning(OCR_TRANSCRIPT));
    let p = pipeline(Arc::new(FixedText("   \n  \n")), ocr.clone());

    let out = p.run(b"%PDF-1.4", "application/pdf");

    assert_eq!(out.method, AcquisitionMethod::Ocr);
    assert_eq!(out.raw_text, OCR_TRANSCRIPT);
    assert_eq!(ocr.sessions_opened(), 1);
    assert_eq!(ocr.sessions_released(), 1);

    let d = &out.data;
    assert_eq!(d.bl_number, "GRIU1234567");
    assert_eq!(d.supplier_name, "ISTANBUL GIDA SAN. A.S.");
    assert_eq!(d.supplier_country, "Turquie");
    assert_eq!(d.client_name, "ETS BAH ET FRERES");
    assert_eq!(d.vessel_name, "GRANDE TEMA");
    assert_eq!(d.port_of_loading, "MERSIN");
    assert_eq!(d.port_of_discharge, "CONAKRY");
    assert_eq!(d.packaging, "Carton");
    assert_eq!(d.package_count, 200);
    assert_eq!(d.gross_weight, 4250.0);

    // GRIU is the BL's carrier prefix, so only the other box survives.
    assert_eq!(d.containers.len(), 1);
    assert_eq!(d.containers[0].number, "TGHU1234560");
    assert_eq!(d.containers[0].seal_number, "TR-88812");
    assert_eq!(d.containers[0].container_type.code(), "20DV");
}

#[test]
fn image_only_pdf_is_read_through_ocr() {
    let ocr = Arc::new(MockOcrEngine::returning("B/L No: MAEU2345678"));
    let p = pipeline(Arc::new(NativePdf), ocr.clone());

    let out = p.run(&scanned_pdf(), "application/pdf");

    assert_eq!(out.method, AcquisitionMethod::Ocr);
    assert_eq!(out.data.bl_number, "MAEU2345678");
    assert_eq!(ocr.sessions_opened(), 1);
    assert_eq!(ocr.sessions_released(), 1);
}

#[test]
fn acquisition_failure_yields_defaults_and_partial_transcript() {
    let ocr = Arc::new(MockOcrEngine::failing("tesseract exited with 1"));
    let p = pipeline(Arc::new(FixedText("B/L No")), ocr.clone());

    let out = p.run(b"%PDF-1.4", "application/pdf");

    assert_eq!(out.method, AcquisitionMethod::Failed);
    assert_eq!(out.data, ExtractedBlData::default());
    assert_eq!(out.raw_text, "B/L No");
    assert_eq!(ocr.sessions_released(), ocr.sessions_opened());
}

#[test]
fn corrupt_pdf_fails_softly() {
    let ocr = Arc::new(MockOcrEngine::returning("unused"));
    let p = pipeline(Arc::new(NativePdf), ocr.clone());

    let out = p.run(b"definitely not a pdf", "application/pdf");

    assert_eq!(out.method, AcquisitionMethod::Failed);
    assert_eq!(out.raw_text, "");
    assert_eq!(ocr.sessions_opened(), 0);
}

#[test]
fn unsupported_media_type_fails_softly() {
    let ocr = Arc::new(MockOcrEngine::returning("unused"));
    let p = pipeline(Arc::new(FixedText("irrelevant")), ocr);

    let out = p.run(b"PK\x03\x04", "application/zip");

    assert_eq!(out.method, AcquisitionMethod::Failed);
    assert_eq!(out.data, ExtractedBlData::default());
}

#[test]
fn outcome_json_shape() {
    let ocr = Arc::new(MockOcrEngine::returning(OCR_TRANSCRIPT));
    let p = pipeline(Arc::new(FixedText("")), ocr);

    let json = serde_json::to_value(p.run(b"%PDF", "application/pdf")).unwrap();

    assert_eq!(json["method"], "ocr");
    assert_eq!(json["data"]["blNumber"], "GRIU1234567");
    assert_eq!(json["data"]["portOfDischarge"], "CONAKRY");
    assert_eq!(json["data"]["containers"][0]["type"], "20DV");
    assert!(json["rawText"].as_str().unwrap().contains("GRANDE TEMA"));
}
