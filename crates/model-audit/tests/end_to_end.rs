//! Full audit runs over in-memory and on-disk workbooks

use model_audit::{
    audit_workbook, run_audit, AuditOptions, CellContent, CellTable, Error, IssueKind, Severity,
    Workbook,
};
use pretty_assertions::assert_eq;
use std::io::{Cursor, Write};

fn sheet(
    workbook: &mut Workbook,
    name: &str,
    values: Vec<Vec<CellContent>>,
    formulas: Vec<Vec<CellContent>>,
) {
    workbook
        .add_sheet(name, CellTable::from_rows(values), CellTable::from_rows(formulas))
        .unwrap();
}

/// A summary sheet reading one cell of another sheet; the summary feeds
/// nothing, so it is the one orphaned calculation
#[test]
fn test_cross_sheet_reference() {
    let mut workbook = Workbook::new();
    sheet(
        &mut workbook,
        "PFNA",
        vec![vec![CellContent::Number(10.0)]],
        vec![vec![CellContent::Number(10.0)]],
    );
    sheet(
        &mut workbook,
        "Summary",
        vec![vec![CellContent::Number(110.0)]],
        vec![vec![CellContent::formula("=PFNA!A1+100")]],
    );

    let report = audit_workbook("summary.xlsx", &workbook, &AuditOptions::default());

    assert_eq!(report.structure.node_count, 2);
    assert_eq!(report.structure.edge_count, 1);
    assert_eq!(report.structure.circular_references, 0);
    assert_eq!(report.formula_cells, 1);
    assert_eq!(
        report
            .structure
            .orphaned_calculations
            .iter()
            .map(|n| n.as_str())
            .collect::<Vec<_>>(),
        vec!["Summary!A1"]
    );
    assert!(report.issues.is_empty());
}

fn balance_sheet(workbook: &mut Workbook, assets: f64, liabilities: f64) {
    let rows = vec![
        vec![
            CellContent::text("Total Assets"),
            CellContent::Blank,
            CellContent::Number(assets),
        ],
        vec![
            CellContent::text("Total Liabilities and Equity"),
            CellContent::Blank,
            CellContent::Number(liabilities),
        ],
    ];
    sheet(workbook, "Balance Sheet", rows.clone(), rows);
}

#[test]
fn test_balance_tolerance() {
    let mut balanced = Workbook::new();
    balance_sheet(&mut balanced, 1_000.0, 999.5);
    let report = audit_workbook("balanced", &balanced, &AuditOptions::default());
    assert!(report.issues.is_empty());

    let mut broken = Workbook::new();
    balance_sheet(&mut broken, 3_000_000.0, 2_000_000.0);
    let report = audit_workbook("broken", &broken, &AuditOptions::default());

    assert_eq!(report.count(Severity::Critical), 1);
    let issue = &report.issues[0];
    assert_eq!(issue.kind(), IssueKind::AccountingMismatch);
    assert!(issue.detail().contains("Total Variance: $1,000,000.00"));
}

#[test]
fn test_circular_model() {
    let mut workbook = Workbook::new();
    let formulas = vec![vec![
        CellContent::formula("=C1*0.05"),
        CellContent::formula("=A1+100"),
        CellContent::formula("=B1"),
    ]];
    sheet(&mut workbook, "Debt", vec![vec![CellContent::Blank; 3]], formulas);

    let report = audit_workbook("debt", &workbook, &AuditOptions::default());

    assert_eq!(report.structure.circular_references, 1);
    assert!(!report.structure.cycles_truncated);
    assert_eq!(report.count(Severity::High), 1);
    assert_eq!(report.issues[0].kind(), IssueKind::CircularReference);
}

#[test]
fn test_report_serializes() {
    let mut workbook = Workbook::new();
    balance_sheet(&mut workbook, 10.0, 0.0);
    let report = audit_workbook("model.xlsx", &workbook, &AuditOptions::default());

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["model"], "model.xlsx");
    assert_eq!(json["sheet_count"], 1);
    assert_eq!(json["complexity"]["score"], 1);
    assert_eq!(json["issues"][0]["type"], "Accounting Mismatch");
    assert_eq!(json["issues"][0]["severity"], "Critical");
}

#[test]
fn test_csv_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("projections.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "Revenue,90,95,=C1*1.1,=D1*1.1,=E1*1.1,=F1*1.1,=G1*1.1,=H1*1.1,150").unwrap();
    writeln!(file, "Check,,,#REF!").unwrap();
    drop(file);

    let report = run_audit(&path, &AuditOptions::default()).unwrap();

    assert_eq!(report.model, "projections.csv");
    assert_eq!(report.sheet_count, 1);
    assert_eq!(report.formula_cells, 6);

    let kinds: Vec<_> = report.issues.iter().map(|i| (i.kind(), i.location())).collect();
    assert_eq!(
        kinds,
        vec![
            (IssueKind::CalculationError, "projections!Row2:Col4"),
            (IssueKind::HardcodedPlug, "projections!Row1"),
        ]
    );
}

#[test]
fn test_unsupported_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.numbers");
    std::fs::write(&path, b"whatever").unwrap();

    let err = run_audit(&path, &AuditOptions::default()).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat(_)));
}

fn xlsx_package(sheet_xml: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options = zip::write::SimpleFileOptions::default();

        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#).unwrap();

        zip.start_file("xl/workbook.xml", options).unwrap();
        zip.write_all(br#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Model" sheetId="1" r:id="rId1"/></sheets></workbook>"#).unwrap();

        zip.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
        zip.write_all(br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#).unwrap();

        zip.start_file("xl/worksheets/sheet1.xml", options).unwrap();
        zip.write_all(sheet_xml.as_bytes()).unwrap();

        zip.finish().unwrap();
    }
    buf
}

#[test]
fn test_xlsx_file_with_external_links() {
    let sheet = concat!(
        r#"<?xml version="1.0"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
        r#"<row r="1"><c r="A1"><f>'[Feed.xlsx]Prices'!B2*2</f><v>4</v></c><c r="B1"><f>'[Feed.xlsx]Prices'!B2+A1</f><v>6</v></c></row>"#,
        r#"</sheetData></worksheet>"#,
    );

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.xlsx");
    std::fs::write(&path, xlsx_package(sheet)).unwrap();

    let report = run_audit(&path, &AuditOptions::default()).unwrap();

    assert_eq!(report.formula_cells, 2);
    let external: Vec<_> = report
        .issues
        .iter()
        .filter(|i| i.kind() == IssueKind::ExternalLink)
        .map(|i| i.location())
        .collect();
    assert_eq!(external, vec!["EXT_LINK:'[Feed.xlsx]Prices'!B2"]);
    assert_eq!(report.count(Severity::Medium), 1);
}
