//! End-to-end conversion tests against the in-memory engine.

mod helpers;

use std::path::PathBuf;

use officeconv_engine::bridge::mock::{MOCK_DOC_HEADER, MockOfficeEngine, PDF_SIGNATURE};
use officeconv_engine::{ConversionError, ConversionOutput, ConversionRequest, FilterDirection};

use helpers::TestConverter;

#[test]
fn test_text_bytes_to_pdf() {
    let mut t = TestConverter::new();

    let output = t
        .orchestrator
        .convert(&ConversionRequest::from_bytes(b"Hello, world".to_vec()).convert_to("pdf"))
        .expect("convert");

    let bytes = output.into_bytes().expect("bytes returned");
    assert!(!bytes.is_empty());
    assert!(bytes.starts_with(PDF_SIGNATURE));
    assert_eq!(t.engine.closes(), 1);
    assert_eq!(t.temp_entries(), 0);
}

#[test]
fn test_empty_input_path_uses_bytes() {
    let mut t = TestConverter::new();
    let mut request = ConversionRequest::from_bytes(b"Hello, world".to_vec()).convert_to("pdf");
    request.input_path = Some(PathBuf::new());

    let bytes = t
        .orchestrator
        .convert(&request)
        .expect("convert")
        .into_bytes()
        .expect("bytes returned");
    assert!(bytes.starts_with(PDF_SIGNATURE));
    assert!(bytes.ends_with(b"Hello, world"));
    assert_eq!(t.temp_entries(), 0);
}

#[test]
fn test_write_to_output_path() {
    let mut t = TestConverter::new();
    let input = t.write_file("letter.txt", b"Dear reader");
    let target = t.file_path("letter.docx");

    let output = t
        .orchestrator
        .convert(&ConversionRequest::from_path(&input).write_to(&target))
        .expect("convert");

    assert_eq!(output, ConversionOutput::Written(target.clone()));
    let written = std::fs::read(&target).expect("output exists");
    assert!(written.starts_with(MOCK_DOC_HEADER.as_bytes()));
    assert!(input.exists(), "caller-owned input must not be removed");
    assert_eq!(t.temp_entries(), 0);
}

#[test]
fn test_round_trip_keeps_document_type() {
    let mut t = TestConverter::new();

    // Spreadsheet: csv -> xlsx -> ods
    let csv = t.write_file("figures.csv", b"a;b\n1;2\n");
    let xlsx = t
        .orchestrator
        .convert(&ConversionRequest::from_path(&csv).convert_to("xlsx"))
        .expect("csv to xlsx")
        .into_bytes()
        .expect("bytes");
    t.orchestrator
        .convert(&ConversionRequest::from_bytes(xlsx).convert_to("ods"))
        .expect("xlsx back to a spreadsheet format");
    let props = t.engine.last_store_properties().expect("stored");
    assert_eq!(props[0].value.as_str(), Some("calc8"));

    // Text: bytes -> docx -> odt
    let docx = t
        .orchestrator
        .convert(&ConversionRequest::from_bytes(b"Chapter".to_vec()).convert_to("docx"))
        .expect("text to docx")
        .into_bytes()
        .expect("bytes");
    t.orchestrator
        .convert(&ConversionRequest::from_bytes(docx).convert_to("odt"))
        .expect("docx back to a text format");
    let props = t.engine.last_store_properties().expect("stored");
    assert_eq!(props[0].value.as_str(), Some("writer8"));
}

#[test]
fn test_unknown_import_filter_fails_before_load() {
    let mut t = TestConverter::new();

    let err = t
        .orchestrator
        .convert(
            &ConversionRequest::from_bytes(b"text".to_vec())
                .convert_to("pdf")
                .with_import_filter("not-a-real-filter"),
        )
        .expect_err("must fail");

    match err {
        ConversionError::InvalidFilterName {
            direction,
            name,
            available,
        } => {
            assert_eq!(direction, FilterDirection::Import);
            assert_eq!(name, "not-a-real-filter");
            let mut sorted = available.clone();
            sorted.sort();
            assert_eq!(available, sorted);
            assert!(available.contains(&"writer8".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(t.engine.loads(), 0);
}

#[test]
fn test_missing_input_fails_before_load() {
    let mut t = TestConverter::new();
    let missing = t.file_path("nowhere.odt");

    let err = t
        .orchestrator
        .convert(&ConversionRequest::from_path(&missing).convert_to("pdf"))
        .expect_err("must fail");

    assert!(matches!(err, ConversionError::InputNotFound { ref path } if *path == missing));
    assert_eq!(t.engine.loads(), 0);
}

#[test]
fn test_unrecognized_output_extension() {
    let mut t = TestConverter::new();
    let target = t.file_path("result.xyz");

    let err = t
        .orchestrator
        .convert(&ConversionRequest::from_bytes(b"text".to_vec()).write_to(&target))
        .expect_err("must fail");

    match &err {
        ConversionError::UnknownExportType { extension } => assert_eq!(extension, ".xyz"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("xyz"));
    assert_eq!(t.engine.closes(), 1);
}

#[test]
fn test_unrecognized_target_extension() {
    let mut t = TestConverter::new();

    let err = t
        .orchestrator
        .convert(&ConversionRequest::from_bytes(b"text".to_vec()).convert_to("xyz"))
        .expect_err("must fail");

    assert!(
        matches!(err, ConversionError::UnknownExportType { ref extension } if extension == "xyz")
    );
    assert_eq!(t.temp_entries(), 0);
}

#[test]
fn test_document_load_failure_names_source_and_filter() {
    let engine = MockOfficeEngine::new();
    engine.set_fail_loads(true);
    let mut t = TestConverter::with_engine(engine);

    let err = t
        .orchestrator
        .convert(&ConversionRequest::from_bytes(b"text".to_vec()).convert_to("pdf"))
        .expect_err("must fail");
    assert_eq!(
        err.to_string(),
        "Could not load document <remote file> using the default filter."
    );

    let mut request = ConversionRequest::from_bytes(b"text".to_vec()).convert_to("pdf");
    request.input_path = Some(PathBuf::new());
    let err = t.orchestrator.convert(&request).expect_err("must fail");
    assert!(err.to_string().contains("<remote file>"));

    let input = t.write_file("broken.docx", b"PK");
    let err = t
        .orchestrator
        .convert(
            &ConversionRequest::from_path(&input)
                .convert_to("pdf")
                .with_import_filter("docx"),
        )
        .expect_err("must fail");
    let message = err.to_string();
    assert!(message.contains("broken.docx"));
    assert!(message.contains("using the docx filter"));
    assert_eq!(t.engine.closes(), 0);
}

#[test]
fn test_unknown_document_type_closes_document() {
    let mut t = TestConverter::new();
    let input = t.write_file("chart.bin", b"MOCKDOC com.example.ChartDocument\ndata");

    let err = t
        .orchestrator
        .convert(&ConversionRequest::from_path(&input).convert_to("pdf"))
        .expect_err("must fail");

    assert!(matches!(err, ConversionError::UnknownDocumentType { .. }));
    assert_eq!(t.engine.closes(), 1);
}

#[test]
fn test_no_filter_for_type_pair() {
    let mut t = TestConverter::new();
    let input = t.write_file("slides.pptx", b"slides");

    let err = t
        .orchestrator
        .convert(&ConversionRequest::from_path(&input).convert_to("xlsx"))
        .expect_err("must fail");

    match &err {
        ConversionError::FilterResolution {
            import_type,
            export_type,
        } => {
            assert_eq!(import_type, "com.sun.star.presentation.PresentationDocument");
            assert_eq!(export_type, "calc_MS_Excel_2007_XML");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(t.engine.closes(), 1);
}

#[test]
fn test_explicit_export_filter_alias() {
    let mut t = TestConverter::new();

    t.orchestrator
        .convert(
            &ConversionRequest::from_bytes(b"text".to_vec())
                .convert_to("html")
                .with_export_filter("html"),
        )
        .expect("convert");

    let props = t.engine.last_store_properties().expect("stored");
    assert_eq!(props[0].value.as_str(), Some("HTML (StarWriter)"));
}

#[test]
fn test_unknown_export_filter_lists_alternatives() {
    let mut t = TestConverter::new();

    let err = t
        .orchestrator
        .convert(
            &ConversionRequest::from_bytes(b"text".to_vec())
                .convert_to("pdf")
                .with_export_filter("pdf_super_export"),
        )
        .expect_err("must fail");

    match &err {
        ConversionError::InvalidFilterName {
            direction,
            available,
            ..
        } => {
            assert_eq!(*direction, FilterDirection::Export);
            assert!(available.contains(&"writer_pdf_Export".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(t.engine.loads(), 1);
    assert_eq!(t.engine.closes(), 1);
}

#[test]
fn test_catalog_cached_across_conversions() {
    let mut t = TestConverter::new();

    for _ in 0..3 {
        t.orchestrator
            .convert(
                &ConversionRequest::from_bytes(b"text".to_vec())
                    .convert_to("pdf")
                    .with_import_filter("Text")
                    .with_export_filter("writer_pdf_Export"),
            )
            .expect("convert");
    }

    // One import and one export catalog query for the whole session
    assert_eq!(t.engine.catalog_queries(), 2);
    assert_eq!(t.engine.closes(), 3);
}
