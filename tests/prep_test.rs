use std::fs;

use fos_classifier::prep::{
    assign_classes, sample_records, split_train_test_validation, ClassDistribution, RawRecord,
    SampleMode, TaxonomyLookup, MAIN_CLASS, SUB_CLASS,
};
use fos_classifier::{load_json, load_records, save_json};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use tempfile::tempdir;

fn source_records() -> Vec<RawRecord> {
    let fields = [
        "Biological sciences",
        "biological sciences",
        "Chemical sciences",
        "Civil engineering",
        "History and archaeology",
        "Underwater basket weaving",
        "Chemical Sciences!",
        "Biological sciences",
    ];
    fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            json!({
                "identifier": format!("oai:{}", i),
                "title": format!("Paper {}", i),
                "abstract": "Lorem ipsum",
                "fieldOfScience": field
            })
            .as_object()
            .cloned()
            .unwrap()
        })
        .collect()
}

fn classification() -> TaxonomyLookup {
    let value = json!({
        "Natural sciences": {"sub": ["Biological sciences", "Chemical sciences"]},
        "Engineering and technology": {"sub": ["Civil engineering"]},
        "Humanities and the arts": {"sub": ["History and archaeology"]}
    });
    TaxonomyLookup::from_json(value.as_object().cloned().unwrap()).unwrap()
}

#[test]
fn test_prepare_then_classify_input() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let assignment = assign_classes(source_records(), &classification());
    assert_eq!(assignment.matched.len(), 7);
    assert_eq!(assignment.unmatched.len(), 1);
    assert_eq!(assignment.unmatched[0]["identifier"], "oai:5");
    assert_eq!(assignment.matched[1][MAIN_CLASS], "Natural sciences");
    assert_eq!(assignment.matched[1][SUB_CLASS], "biological sciences");

    let path = dir.path().join("tagged.json");
    save_json(&assignment.matched, &path)?;

    // Tagged output doubles as classifier input
    let records = load_records(&path)?;
    assert_eq!(records.len(), 7);
    assert_eq!(records[3].label(MAIN_CLASS)?, Some("Engineering and technology"));
    Ok(())
}

#[test]
fn test_stats_csv_on_disk() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let tagged = assign_classes(source_records(), &classification()).matched;

    let distribution = ClassDistribution::from_records(&tagged);
    let summary = distribution.summary();
    assert_eq!(summary.total_entries, 7);
    assert_eq!(summary.unique_main_classes, 3);
    assert_eq!(summary.most_common_main_class, Some(("Natural sciences".to_string(), 5)));
    assert_eq!(summary.least_common_main_class, Some(("Humanities and the arts".to_string(), 1)));

    let path = dir.path().join("stats.csv");
    distribution.write_csv(fs::File::create(&path)?)?;
    let csv = fs::read_to_string(&path)?;
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("main-class,sub-class,count"));
    assert_eq!(lines.next(), Some("Natural sciences,,5"));
    assert_eq!(lines.next(), Some("Natural sciences,Biological sciences,2"));
    assert!(csv.contains("Engineering and technology,Civil engineering,1\r\n"));
    Ok(())
}

#[test]
fn test_seeded_sampling_is_reproducible() -> Result<(), Box<dyn std::error::Error>> {
    let records = source_records();
    let first = sample_records(&records, 3, SampleMode::All, None, &mut StdRng::seed_from_u64(11))?;
    let second = sample_records(&records, 3, SampleMode::All, None, &mut StdRng::seed_from_u64(11))?;
    assert_eq!(first, second);
    assert!(sample_records(&records, 1, SampleMode::Train, None, &mut StdRng::seed_from_u64(11)).is_err());
    Ok(())
}

#[test]
fn test_split_round_trips_through_files() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let split = split_train_test_validation(source_records(), &mut StdRng::seed_from_u64(5));
    for (name, part) in split.parts() {
        save_json(part, dir.path().join(format!("data_{}.json", name)))?;
    }

    let train: Vec<RawRecord> = load_json(dir.path().join("data_train.json"))?;
    let test: Vec<RawRecord> = load_json(dir.path().join("data_test.json"))?;
    let validation: Vec<RawRecord> = load_json(dir.path().join("data_validation.json"))?;
    assert_eq!((train.len(), test.len(), validation.len()), (6, 1, 1));
    Ok(())
}
