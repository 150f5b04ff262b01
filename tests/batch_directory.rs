//! End-to-end runs over a directory of checklists

use std::path::Path;

use chrono::NaiveDate;
use stig_annotator::checklist::{
    open_checklist, report_directory, BatchJob, ChecklistDocument, CommentField, CommentLogError,
    Transformation,
};
use stig_annotator::AnnotatorConfig;

const CKL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<CHECKLIST>
	<ASSET>
		<HOST_NAME>db01</HOST_NAME>
	</ASSET>
	<STIGS>
		<iSTIG>
			<VULN>
				<STIG_DATA>
					<VULN_ATTRIBUTE>Vuln_Num</VULN_ATTRIBUTE>
					<ATTRIBUTE_DATA>V-100</ATTRIBUTE_DATA>
				</STIG_DATA>
				<STIG_DATA>
					<VULN_ATTRIBUTE>Check_Content</VULN_ATTRIBUTE>
					<ATTRIBUTE_DATA>Verify the system uses FIPS 140-2 modules.</ATTRIBUTE_DATA>
				</STIG_DATA>
				<STATUS>Open</STATUS>
				<FINDING_DETAILS></FINDING_DETAILS>
				<COMMENTS>X validated on 01/01/2020 that the finding is OPEN.
foo
bar</COMMENTS>
			</VULN>
			<VULN>
				<STIG_DATA>
					<VULN_ATTRIBUTE>Vuln_Num</VULN_ATTRIBUTE>
					<ATTRIBUTE_DATA>V-101</ATTRIBUTE_DATA>
				</STIG_DATA>
				<STATUS>Unknown_Status</STATUS>
				<COMMENTS>keep me</COMMENTS>
			</VULN>
		</iSTIG>
	</STIGS>
</CHECKLIST>
"#;

const CKLB: &str = r#"{
  "title": "app01",
  "stigs": [
    {
      "rules": [
        {
          "group_id": "V-200",
          "check_content": "Verify banner text.",
          "status": "not_applicable",
          "comments": "Z validated on 2020/05/05 that the finding is NOT APPLICABLE.\nnote"
        }
      ]
    }
  ]
}"#;

fn config(suffix: &str) -> AnnotatorConfig {
    AnnotatorConfig::builder()
        .reviewer("Y")
        .review_date(NaiveDate::from_ymd_opt(2021, 2, 2).unwrap())
        .output_suffix(suffix)
        .build()
}

fn seed(dir: &Path) {
    std::fs::write(dir.join("db01.ckl"), CKL).unwrap();
    std::fs::write(dir.join("app01.cklb"), CKLB).unwrap();
    std::fs::write(dir.join("readme.txt"), "not a checklist").unwrap();
}

#[test]
fn append_duplicate_over_directory() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let job = BatchJob::from_config(&config("_y"), Transformation::AppendDuplicate);
    let summary = job.run_directory(dir.path()).unwrap();

    assert_eq!(summary.files.len(), 2);
    assert!(summary.file_failures.is_empty());
    assert_eq!(summary.record_failures(), 1);
    assert!(!summary.is_clean());

    let ckl_out = dir.path().join("db01_y.ckl");
    let doc = open_checklist(&ckl_out).unwrap();
    let records = doc.records();
    assert_eq!(
        records[0].comments.as_deref(),
        Some(
            "Y validated on 02/02/2021 that the finding is OPEN.\nfoo\nbar\n\
             X validated on 01/01/2020 that the finding is OPEN.\nfoo\nbar"
        )
    );
    assert_eq!(records[1].comments.as_deref(), Some("keep me"));

    let cklb_out = dir.path().join("app01_y.cklb");
    let doc = open_checklist(&cklb_out).unwrap();
    assert_eq!(
        doc.record(0).unwrap().comments.as_deref(),
        Some(
            "Y validated on 02/02/2021 that the finding is NOT APPLICABLE.\nnote\n\
             Z validated on 2020/05/05 that the finding is NOT APPLICABLE.\nnote"
        )
    );

    let failure = summary
        .files
        .iter()
        .flat_map(|f| f.summary.failures.iter())
        .next()
        .unwrap();
    assert_eq!(failure.record_id, "V-101");
    assert_eq!(failure.error, CommentLogError::invalid_status("Unknown_Status"));

    // Inputs are untouched
    assert_eq!(std::fs::read_to_string(dir.path().join("app01.cklb")).unwrap(), CKLB);
}

#[test]
fn second_run_skips_outputs() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let job = BatchJob::from_config(&config("_y"), Transformation::RefreshDate);
    let first = job.run_directory(dir.path()).unwrap();
    assert_eq!(first.files.len(), 2);

    let second = job.run_directory(dir.path()).unwrap();
    assert_eq!(second.files.len(), 2);
    for outcome in &second.files {
        let name = outcome.input.file_name().unwrap().to_str().unwrap();
        assert!(!name.contains("_y."), "output {} was reprocessed", name);
    }

    let doc = open_checklist(dir.path().join("app01_y.cklb")).unwrap();
    assert_eq!(
        doc.record(0).unwrap().comments.as_deref(),
        Some("Z validated on 02/02/2021 that the finding is NOT APPLICABLE.\nnote")
    );
}

#[test]
fn broken_file_does_not_stop_the_run() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    std::fs::write(dir.path().join("broken.ckl"), "<CHECKLIST><STIGS>").unwrap();

    let out = tempfile::tempdir().unwrap();
    let job = BatchJob::from_config(&config("_y"), Transformation::InsertFresh)
        .with_output_dir(out.path());
    let summary = job.run_directory(dir.path()).unwrap();

    assert_eq!(summary.files.len(), 2);
    assert_eq!(summary.file_failures.len(), 1);
    assert!(summary.file_failures[0].path.ends_with("broken.ckl"));
    assert!(out.path().join("db01_y.ckl").exists());
    assert!(out.path().join("app01_y.cklb").exists());
    assert!(!dir.path().join("db01_y.ckl").exists());
}

#[test]
fn move_comments_then_refresh_finding_details() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let moved = BatchJob::from_config(&config("_moved"), Transformation::MoveCommentsToFindingDetails)
        .run_file(dir.path().join("app01.cklb"))
        .unwrap();
    assert!(moved.summary.is_clean());

    let refreshed = BatchJob::from_config(&config("_fresh"), Transformation::RefreshDate)
        .with_field(CommentField::FindingDetails)
        .run_file(&moved.output)
        .unwrap();
    assert_eq!(refreshed.summary.rewritten, 1);
    assert!(refreshed.output.ends_with("app01_moved_fresh.cklb"));

    let record = open_checklist(&refreshed.output).unwrap().record(0).unwrap();
    assert_eq!(record.comments.as_deref(), Some(""));
    assert_eq!(
        record.finding_details.as_deref(),
        Some("Z validated on 02/02/2021 that the finding is NOT APPLICABLE.\nnote")
    );
}

#[test]
fn fips_report_across_formats() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let mut out = Vec::new();
    let summary = report_directory(dir.path(), |r| r.check_content.contains("FIPS"), &mut out)
        .unwrap();

    assert_eq!(summary.total(), 1);
    assert_eq!(summary.per_file.len(), 2);

    let mut reader = csv::Reader::from_reader(out.as_slice());
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][0], "V-100");
    assert_eq!(&rows[0][9], "Open");
}
