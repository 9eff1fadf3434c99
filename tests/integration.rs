//! Integration tests for the radicación pipeline

mod common;

use common::{labeled_pdf, page_labels, reference_workbook};
use pdf_radicacion::pdf::count_pages;
use pdf_radicacion::{
    BatchConfig, BatchProcessor, DiagnosticKind, Error, RawDocument, ReferenceTable, RunStage,
    UnknownSubtypePolicy,
};

const NIT: &str = "900364721";

fn processor() -> BatchProcessor {
    BatchProcessor::new(&BatchConfig::default()).expect("default config is valid")
}

fn doc(name: &str, labels: &[&str]) -> RawDocument {
    RawDocument::new(name, labeled_pdf(labels))
}

#[test]
fn test_scenario_a_one_artifact_per_subtype() {
    let reference = reference_workbook(&[(12, "FAC-900")]);
    let documents = vec![doc("12.0.pdf", &["invoice"]), doc("12.1.pdf", &["history"])];

    let report = processor().run(documents, &reference, NIT).unwrap();

    assert!(report.diagnostics.is_empty(), "unexpected: {:?}", report.diagnostics);
    let names: Vec<&str> = report.artifacts.iter().map(|a| a.filename.as_str()).collect();
    assert_eq!(
        names,
        vec!["FAC_900364721_FAC-900.pdf", "HEV_900364721_FAC-900.pdf"]
    );
    assert_eq!(page_labels(&report.artifacts[0].content), vec!["invoice"]);
    assert_eq!(page_labels(&report.artifacts[1].content), vec!["history"]);
}

#[test]
fn test_scenario_b_unresolved_consecutive() {
    let reference = reference_workbook(&[]);
    let report = processor()
        .run(vec![doc("99.0.pdf", &["x"])], &reference, NIT)
        .unwrap();

    assert!(report.artifacts.is_empty());
    assert_eq!(report.diagnostics.len(), 1);
    let diagnostic = &report.diagnostics[0];
    assert_eq!(diagnostic.kind, DiagnosticKind::UnresolvedConsecutive);
    assert!(diagnostic.message.contains("99"), "message: {}", diagnostic.message);
    assert_eq!(report.summary(), "0 succeeded, 1 skipped");
}

#[test]
fn test_scenario_c_invalid_name_run_completes() {
    let reference = reference_workbook(&[(1, "A")]);
    let mut processor = processor();
    let report = processor
        .run(vec![doc("abc.pdf", &["x"])], &reference, NIT)
        .unwrap();

    assert_eq!(processor.stage(), RunStage::Done);
    assert!(report.artifacts.is_empty());
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].kind, DiagnosticKind::NameFormatInvalid);
    assert_eq!(report.diagnostics[0].subject, "abc.pdf");
    assert!(report.diagnostics[0].message.contains("invalid name format"));
}

#[test]
fn test_scenario_d_rescans_are_concatenated_in_upload_order() {
    let reference = reference_workbook(&[(5, "INV-1")]);
    let documents = vec![
        doc("5.2.pdf", &["scan-1a", "scan-1b"]),
        doc("5.2 (2).pdf", &["scan-2"]),
    ];

    let report = processor().run(documents, &reference, NIT).unwrap();

    assert!(report.diagnostics.is_empty());
    assert_eq!(report.artifacts.len(), 1);
    let artifact = &report.artifacts[0];
    assert_eq!(artifact.filename, "EPI_900364721_INV-1.pdf");
    assert_eq!(artifact.pages, 3);
    assert_eq!(page_labels(&artifact.content), vec!["scan-1a", "scan-1b", "scan-2"]);
}

#[test]
fn test_merge_order_ignores_upload_order() {
    let reference = reference_workbook(&[(8, "R-8")]);
    let documents = vec![
        doc("8.3.2.pdf", &["F2"]),
        doc("8.3.1.pdf", &["F1"]),
        doc("8.3.pdf", &["B1", "B2"]),
    ];

    let report = processor().run(documents, &reference, NIT).unwrap();

    assert_eq!(report.artifacts.len(), 1);
    assert_eq!(
        page_labels(&report.artifacts[0].content),
        vec!["B1", "B2", "F1", "F2"]
    );
    assert_eq!(
        count_pages(&report.artifacts[0].filename, &report.artifacts[0].content).unwrap(),
        4
    );
}

#[test]
fn test_unparsable_reference_aborts_before_any_artifact() {
    let mut processor = processor();
    let result = processor.run(vec![doc("1.0.pdf", &["x"])], b"consecutivo;factura\n1;A", NIT);

    assert!(matches!(result, Err(Error::ReferenceTableMalformed(_))));
    assert_eq!(processor.stage(), RunStage::Failed);
}

#[test]
fn test_no_documents_is_fatal() {
    let reference = reference_workbook(&[(1, "A")]);
    let result = processor().run(Vec::new(), &reference, NIT);
    assert!(matches!(result, Err(Error::EmptyBatch)));
}

#[test]
fn test_workbook_loading() {
    let bytes = reference_workbook(&[(1, " A-1 "), (2, "B-2"), (1, "A-2")]);
    let table = ReferenceTable::from_workbook_bytes(&bytes).unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(table.get(1), Some("A-2"));
    assert_eq!(table.get(2), Some("B-2"));
    assert_eq!(table.overridden_ids(), &[1]);
}

#[test]
fn test_workbook_with_non_integral_id_is_malformed() {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "consecutivo").unwrap();
    sheet.write_string(0, 1, "factura").unwrap();
    sheet.write_number(1, 0, 3.5).unwrap();
    sheet.write_string(1, 1, "X").unwrap();
    let bytes = workbook.save_to_buffer().unwrap();

    let err = ReferenceTable::from_workbook_bytes(&bytes).unwrap_err();
    assert!(matches!(err, Error::ReferenceTableMalformed(ref msg) if msg.contains("row 2")));
}

#[test]
fn test_mixed_batch_reports_every_skip() {
    let reference = reference_workbook(&[(1, "R1"), (2, "R2"), (3, "R3")]);
    let documents = vec![
        doc("1.0.pdf", &["1"]),
        doc("2.77.pdf", &["2"]),
        doc("3.0.pdf", &["3"]),
        RawDocument::new("3.1.pdf", b"%PDF-1.4 truncated".to_vec()),
        doc("4.0.pdf", &["4"]),
        doc("scan final.pdf", &["?"]),
    ];

    let report = processor().run(documents, &reference, NIT).unwrap();

    assert_eq!(report.stats.documents, 6);
    assert_eq!(report.stats.groups, 5);
    assert_eq!(report.summary(), "2 succeeded, 4 skipped");

    let mut kinds: Vec<DiagnosticKind> = report.diagnostics.iter().map(|d| d.kind).collect();
    kinds.sort_by_key(|k| format!("{:?}", k));
    assert_eq!(
        kinds,
        vec![
            DiagnosticKind::MergeFailed,
            DiagnosticKind::NameFormatInvalid,
            DiagnosticKind::UnknownSubtype,
            DiagnosticKind::UnresolvedConsecutive,
        ]
    );
}

#[test]
fn test_non_ascii_digits_are_invalid_names() {
    let config = BatchConfig::from_toml_str("unknown_subtype = \"fallback\"\n").unwrap();
    let reference = reference_workbook(&[(1, "R1")]);
    let report = BatchProcessor::new(&config)
        .unwrap()
        .run(vec![doc("1.\u{0663}.pdf", &["x"])], &reference, NIT)
        .unwrap();

    assert!(report.artifacts.is_empty());
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].kind, DiagnosticKind::NameFormatInvalid);
}

#[test]
fn test_record_number_with_slash_is_reported_not_written() {
    let reference = reference_workbook(&[(1, "FAC/900"), (2, "OK")]);
    let documents = vec![doc("1.0.pdf", &["a"]), doc("2.0.pdf", &["b"])];

    let report = processor().run(documents, &reference, NIT).unwrap();

    let names: Vec<&str> = report.artifacts.iter().map(|a| a.filename.as_str()).collect();
    assert_eq!(names, vec!["FAC_900364721_OK.pdf"]);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].kind, DiagnosticKind::UnusableOutputName);
    assert_eq!(report.summary(), "1 succeeded, 1 skipped");
}

#[test]
fn test_fallback_policy_from_config() {
    let config = BatchConfig::from_toml_str(
        "unknown_subtype = \"fallback\"\nfallback_abbreviation = \"OTRO\"\nconcurrency = 2\n",
    )
    .unwrap();
    assert_eq!(config.unknown_subtype, UnknownSubtypePolicy::Fallback);

    let reference = reference_workbook(&[(2, "R2")]);
    let report = BatchProcessor::new(&config)
        .unwrap()
        .run(vec![doc("2.77.pdf", &["x"])], &reference, NIT)
        .unwrap();

    assert!(report.is_clean());
    assert_eq!(report.artifacts[0].filename, "OTRO_900364721_R2.pdf");
}

#[test]
fn test_rerunning_a_batch_is_deterministic() {
    let reference = reference_workbook(&[(1, "R1"), (2, "R2")]);
    let documents = || {
        vec![
            doc("2.0.pdf", &["a"]),
            doc("1.3.1.pdf", &["b"]),
            doc("1.3.pdf", &["c"]),
            doc("2.0 (2).pdf", &["d"]),
        ]
    };

    let first = processor().run(documents(), &reference, NIT).unwrap();
    let second = processor().run(documents(), &reference, NIT).unwrap();

    assert_eq!(first.artifacts, second.artifacts);
    assert_eq!(first.diagnostics, second.diagnostics);
}
