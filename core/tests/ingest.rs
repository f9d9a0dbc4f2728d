use dca_core::{
    case::{AssignedCase, Case, ScoredCase},
    error::DcaError,
    ingest::{read_cases, read_training_cases, write_assigned, write_cases, CaseTable},
    types::RecoveryLikelihood,
};

// ── Test helpers ────────────────────────────────────────────────────────────

const HEADER: &str =
    "case_id,amount_owed,days_overdue,customer_type,payment_history,contact_attempts,region";

fn csv_with(rows: &[&str]) -> String {
    let mut s = String::from(HEADER);
    for row in rows {
        s.push('\n');
        s.push_str(row);
    }
    s
}

fn output_lines(bytes: Vec<u8>) -> Vec<String> {
    String::from_utf8(bytes).unwrap().lines().map(str::to_string).collect()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn reads_well_formed_rows_in_order() {
    let input = csv_with(&[
        "C1,500,10,Individual,Excellent,0,North",
        "C2,30000.50,200,Enterprise,Poor,4,West",
    ]);
    let table = read_cases(input.as_bytes()).unwrap();
    let cases = table.cases();

    assert_eq!(cases.len(), 2);
    assert_eq!(cases[0].case_id(), "C1");
    assert_eq!(cases[1].amount_owed(), 30_000.5);
    assert_eq!(cases[1].days_overdue(), 200);
    assert_eq!(cases[1].recovery_likelihood(), None);
}

/// Every missing column is reported at once.
#[test]
fn missing_columns_are_all_listed() {
    let input = "case_id,amount_owed,customer_type,region\nC1,100,SMB,North";
    let err = read_cases(input.as_bytes()).unwrap_err();

    match err {
        DcaError::MalformedInput { missing } => {
            assert_eq!(missing, ["days_overdue", "payment_history", "contact_attempts"]);
        }
        other => panic!("expected MalformedInput, got {other}"),
    }
}

/// Training input also requires the label column.
#[test]
fn training_input_requires_label_column() {
    let err = read_training_cases(csv_with(&["C1,500,10,SMB,Good,0,North"]).as_bytes()).unwrap_err();
    match err {
        DcaError::MalformedInput { missing } => assert_eq!(missing, ["recovery_likelihood"]),
        other => panic!("expected MalformedInput, got {other}"),
    }
}

/// `customer_id` is accepted in place of `case_id`.
#[test]
fn customer_id_alias_is_accepted() {
    let input = "customer_id,amount_owed,days_overdue,customer_type,payment_history,contact_attempts,region\n\
                 CUST-7,1200,45,SMB,Fair,2,South";
    let table = read_cases(input.as_bytes()).unwrap();
    assert_eq!(table.cases()[0].case_id(), "CUST-7");
    assert_eq!(table.headers()[0], "customer_id");
}

#[test]
fn bad_values_name_the_row() {
    let cases = [
        ("C1,abc,10,SMB,Good,0,North", "amount_owed"),
        ("C1,-5,10,SMB,Good,0,North", "amount_owed"),
        ("C1,500,ten,SMB,Good,0,North", "days_overdue"),
        ("C1,500,10,SMB,Good,-1,North", "contact_attempts"),
        ("C1,500,10,SMB,Good,0,", "region"),
    ];
    for (row, column) in cases {
        let input = csv_with(&["C0,100,5,SMB,Good,0,North", row]);
        match read_cases(input.as_bytes()).unwrap_err() {
            DcaError::InvalidRow { row: 2, reason } => {
                assert!(reason.contains(column), "'{reason}' should mention {column}");
            }
            other => panic!("expected InvalidRow at row 2, got {other}"),
        }
    }
}

/// Integral floats in count columns are accepted.
#[test]
fn integral_float_counts_are_accepted() {
    let table = read_cases(csv_with(&["C1,500,45.0,SMB,Good,3.0,North"]).as_bytes()).unwrap();
    assert_eq!(table.cases()[0].days_overdue(), 45);
    assert_eq!(table.cases()[0].contact_attempts(), 3);

    let err = read_cases(csv_with(&["C1,500,45.5,SMB,Good,3,North"]).as_bytes()).unwrap_err();
    assert!(matches!(err, DcaError::InvalidRow { row: 1, .. }));
}

#[test]
fn labels_parse_case_insensitively() {
    let input = format!("{HEADER},recovery_likelihood\nC1,500,10,SMB,Good,0,North,high\nC2,500,10,SMB,Good,0,North,Low");
    let cases = read_training_cases(input.as_bytes()).unwrap();
    assert_eq!(cases[0].recovery_likelihood(), Some(RecoveryLikelihood::High));
    assert_eq!(cases[1].recovery_likelihood(), Some(RecoveryLikelihood::Low));

    let bad = format!("{HEADER},recovery_likelihood\nC1,500,10,SMB,Good,0,North,Maybe");
    assert!(matches!(
        read_training_cases(bad.as_bytes()).unwrap_err(),
        DcaError::InvalidRow { row: 1, .. }
    ));
}

/// Training files written by the generator read back identically.
#[test]
fn written_training_file_reads_back() {
    let cases = vec![
        Case::new("C0001", 1234.5, 77, "SMB", "Fair", 3, "East")
            .unwrap()
            .with_label(RecoveryLikelihood::Medium),
        Case::new("C0002", 99.0, 12, "Individual", "Excellent", 0, "North")
            .unwrap()
            .with_label(RecoveryLikelihood::High),
    ];
    let mut buf = Vec::new();
    write_cases(&mut buf, &cases).unwrap();

    let back = read_training_cases(buf.as_slice()).unwrap();
    assert_eq!(back, cases);
}

fn assigned(id: &str, agency: &str) -> AssignedCase {
    let case = Case::new(id, 500.0, 10, "SMB", "Good", 0, "North").unwrap();
    AssignedCase::from_scored(
        ScoredCase { case, predicted_recovery: RecoveryLikelihood::High, confidence_score: 0.75 },
        agency,
    )
}

/// In-memory batches use the training layout plus the three result columns.
#[test]
fn assigned_output_columns_and_delimiter() {
    let batch = vec![assigned("C1", "Alpha Collections")];
    let table = CaseTable::from_cases(batch.iter().map(|a| a.case.clone()).collect());

    let mut buf = Vec::new();
    write_assigned(&mut buf, &table, &batch, b';').unwrap();
    let lines = output_lines(buf);

    assert_eq!(
        lines[0],
        "case_id;amount_owed;days_overdue;customer_type;payment_history;contact_attempts;region;\
         recovery_likelihood;predicted_recovery;confidence_score;dca_assigned"
    );
    assert_eq!(lines[1], "C1;500;10;SMB;Good;0;North;;High;0.75;Alpha Collections");
}

/// Extra input columns and the `customer_id` header survive export
/// under their original names, in their original order.
#[test]
fn extra_columns_and_id_alias_are_written_back() {
    let input = "region,customer_id,notes,amount_owed,days_overdue,customer_type,payment_history,contact_attempts\n\
                 North,C1,call after 5pm,500.00,10,SMB,Good,0";
    let table = read_cases(input.as_bytes()).unwrap();
    let batch = vec![assigned("C1", "Alpha Collections")];

    let mut buf = Vec::new();
    write_assigned(&mut buf, &table, &batch, b',').unwrap();
    let lines = output_lines(buf);

    assert_eq!(
        lines[0],
        "region,customer_id,notes,amount_owed,days_overdue,customer_type,payment_history,\
         contact_attempts,predicted_recovery,confidence_score,dca_assigned"
    );
    assert_eq!(
        lines[1],
        "North,C1,call after 5pm,500.00,10,SMB,Good,0,High,0.75,Alpha Collections"
    );
}

/// A file that already has result columns gets them overwritten in place.
#[test]
fn existing_result_columns_are_replaced() {
    let input = format!(
        "{HEADER},dca_assigned,notes\nC1,500,10,SMB,Good,0,North,Old Agency,keep me"
    );
    let table = read_cases(input.as_bytes()).unwrap();
    let batch = vec![assigned("C1", "Epsilon Group")];

    let mut buf = Vec::new();
    write_assigned(&mut buf, &table, &batch, b',').unwrap();
    let lines = output_lines(buf);

    assert_eq!(lines[0], format!("{HEADER},dca_assigned,notes,predicted_recovery,confidence_score"));
    assert_eq!(lines[1], "C1,500,10,SMB,Good,0,North,Epsilon Group,keep me,High,0.75");
}

#[test]
fn duplicate_case_ids_are_rejected() {
    let input = csv_with(&["C1,500,10,SMB,Good,0,North", "C1,700,20,SMB,Fair,1,South"]);
    match read_cases(input.as_bytes()).unwrap_err() {
        DcaError::InvalidRow { row: 2, reason } => assert!(reason.contains("duplicate case_id 'C1'")),
        other => panic!("expected InvalidRow at row 2, got {other}"),
    }

    let labelled = format!("{HEADER},recovery_likelihood\nC9,1,1,SMB,Good,0,North,High\nC9,1,1,SMB,Good,0,North,Low");
    assert!(matches!(
        read_training_cases(labelled.as_bytes()).unwrap_err(),
        DcaError::InvalidRow { row: 2, .. }
    ));
}

/// Whole amounts are written without a trailing fraction.
#[test]
fn whole_amounts_keep_their_text() {
    let cases = vec![Case::new("C1", 500.0, 10, "SMB", "Good", 0, "North").unwrap()];
    let mut buf = Vec::new();
    write_cases(&mut buf, &cases).unwrap();
    let lines = output_lines(buf);
    assert_eq!(lines[1], "C1,500,10,SMB,Good,0,North,");
}

/// Assigned rows must line up with the table they are written against.
#[test]
fn mismatched_batch_is_rejected() {
    let table = read_cases(csv_with(&["C1,500,10,SMB,Good,0,North"]).as_bytes()).unwrap();

    let wrong_id = vec![assigned("C2", "Alpha Collections")];
    let err = write_assigned(Vec::new(), &table, &wrong_id, b',').unwrap_err();
    assert!(matches!(err, DcaError::InvalidRow { row: 1, .. }));

    assert!(write_assigned(Vec::new(), &table, &[], b',').is_err());
}
