use smoke_terms::pipeline::observer::StageTimingObserver;
use smoke_terms::{
    Dictionary, GenerationConfig, GenerationPipeline, Metric, NoopObserver, Record, RunSpec,
    ScoringPipeline, TermExtractor,
};

fn aviation() -> Vec<Record> {
    vec![
        Record::labeled("1", "smoke detected in cabin", "hazard"),
        Record::labeled("2", "routine flight", "normal"),
        Record::labeled("3", "smoke in cargo hold", "hazard"),
    ]
}

fn generate_tfidf() -> smoke_terms::GenerationResult {
    let config = GenerationConfig::new(1, "hazard").with_metrics(vec![Metric::TfIdf]);
    GenerationPipeline::new(config)
        .unwrap()
        .run(&aviation(), &mut NoopObserver)
        .unwrap()
}

#[test]
fn smoke_outranks_routine_and_drives_scoring() {
    let generated = generate_tfidf();
    let position = |g: &str| generated.entries.iter().position(|e| e.ngram == g).unwrap();
    assert!(position("smoke") < position("routine"));

    let smoke_weight = generated
        .rows()
        .find(|(g, _)| *g == "smoke")
        .map(|(_, w)| w)
        .unwrap();
    assert!((smoke_weight - 2.0 * 1.5f64.ln()).abs() < 1e-12);

    let scoring = ScoringPipeline::from_generation(&generated).unwrap();
    let scored = scoring
        .run(&[Record::new("q", "smoke near engine")], 1, &mut NoopObserver)
        .unwrap();
    let record = &scored.records[0];
    assert!(record.score > 0.0);
    assert_eq!(record.matched_terms.len(), 1);
    assert_eq!(record.matched_terms[0].ngram, "smoke");
    assert_eq!(record.score, smoke_weight);
}

#[test]
fn generation_is_deterministic() {
    let first = generate_tfidf();
    let second = generate_tfidf();
    assert_eq!(first.entries, second.entries);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn parallel_and_sequential_generation_agree() {
    let corpus: Vec<Record> = (0..600)
        .map(|i| {
            let (text, label) = match i % 3 {
                0 => ("smoke detected in the cabin area", "hazard"),
                1 => ("routine flight with normal cruise", "normal"),
                _ => ("burning smell near cargo hold", "hazard"),
            };
            Record::labeled(i.to_string(), text, label)
        })
        .collect();
    let config = GenerationConfig::new(2, "hazard")
        .with_metrics(vec![Metric::ChiSquared, Metric::LogLikelihood])
        .with_top_k(None);

    let parallel = GenerationPipeline::new(config.clone())
        .unwrap()
        .run(&corpus, &mut NoopObserver)
        .unwrap();
    let sequential = GenerationPipeline::new(config.with_parallel(false))
        .unwrap()
        .run(&corpus, &mut NoopObserver)
        .unwrap();
    assert_eq!(parallel.entries, sequential.entries);
    assert_eq!(parallel.summary, sequential.summary);
}

#[test]
fn empty_dictionary_scores_zero() {
    let scoring =
        ScoringPipeline::new(Dictionary::empty(1).unwrap(), TermExtractor::new(1).unwrap()).unwrap();
    let result = scoring.run(&aviation(), 1, &mut NoopObserver).unwrap();
    assert_eq!(result.records.len(), 3);
    for record in &result.records {
        assert_eq!(record.score, 0.0);
        assert!(record.matched_terms.is_empty());
    }
    let rows: Vec<_> = result.records.iter().map(|r| r.row).collect();
    assert_eq!(rows, vec![0, 1, 2]);
}

#[test]
fn equal_scores_keep_input_order() {
    let scoring = ScoringPipeline::new(
        Dictionary::new(1, [("smoke", 1.0)]).unwrap(),
        TermExtractor::new(1).unwrap(),
    )
    .unwrap();
    let records: Vec<Record> = (0..50)
        .map(|i| Record::new(format!("r{i}"), "smoke reported"))
        .collect();
    let result = scoring.run(&records, 1, &mut NoopObserver).unwrap();
    let rows: Vec<_> = result.records.iter().map(|r| r.row).collect();
    assert_eq!(rows, (0..50).collect::<Vec<_>>());
}

#[test]
fn run_spec_drives_bigram_generation() {
    let spec = RunSpec::from_json(
        r#"{
            "v": 1,
            "n": 2,
            "target_label": "hazard",
            "labels": ["hazard", "normal"],
            "metrics": ["tf_idf", "chi2"],
            "combination": { "rule": "weighted_sum", "weights": { "tf_idf": 0.5, "chi2": 0.5 } },
            "top_k": 3
        }"#,
    )
    .unwrap();
    let config = spec.into_config().unwrap();
    let mut observer = StageTimingObserver::new();
    let generated = GenerationPipeline::new(config)
        .unwrap()
        .run(&aviation(), &mut observer)
        .unwrap();

    assert_eq!(generated.n, 2);
    assert_eq!(generated.entries.len(), 3);
    assert!(generated.entries.iter().all(|e| e.ngram.split(' ').count() == 2));
    assert!(generated
        .entries
        .iter()
        .all(|e| e.metrics.contains_key(&Metric::TfIdf) && e.metrics.contains_key(&Metric::ChiSquared)));
    assert_eq!(observer.reports().len(), 4);

    let scoring = ScoringPipeline::from_generation(&generated).unwrap();
    let scored = scoring
        .run(&[Record::new("q", "Smoke in cargo hold again")], 2, &mut NoopObserver)
        .unwrap();
    assert!(scored.records[0].score > 0.0);
}

#[test]
fn invalid_run_spec_reports_every_problem() {
    let err = RunSpec::from_json(r#"{ "v": 2, "n": 0, "target_label": "hazard" }"#)
        .unwrap()
        .into_config()
        .unwrap_err();
    assert!(err.is_configuration());
    match err {
        smoke_terms::SmokeError::InvalidSpec(errors) => assert_eq!(errors.len(), 2),
        other => panic!("unexpected error: {other}"),
    }
}
