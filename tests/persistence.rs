use std::fs;
use std::sync::Arc;

use skill_match::{
    query_latent_model, suggest_next_skills, train_latent_model, Catalog, CatalogRepository,
    LatentModel, LatentParams, LearningPathPlanner, ModelStore, ProficiencyLevel, ProficiencyScale,
    SkillGraph, SkillSet,
};

fn catalog() -> Catalog {
    Catalog::from_json_str(include_str!("../data/course_skills.json")).unwrap()
}

fn sample_skills() -> SkillSet {
    SkillSet::new()
        .with("SQL", ProficiencyLevel::Advanced)
        .with("Data Modeling", ProficiencyLevel::Intermediate)
        .with_certified("Python", ProficiencyLevel::Beginner)
}

#[test]
fn saved_model_answers_like_the_original() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latent_model.json");

    let model = LatentModel::train(&catalog(), LatentParams::new(4, 42)).unwrap();
    model.save(&path).unwrap();
    let loaded = LatentModel::load(&path).unwrap();

    assert_eq!(loaded.query(&sample_skills(), 6), model.query(&sample_skills(), 6));

    let resaved = dir.path().join("resaved.json");
    loaded.save(&resaved).unwrap();
    assert_eq!(fs::read(&path).unwrap(), fs::read(&resaved).unwrap());
}

#[test]
fn store_trains_once_then_loads() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::new(dir.path().join("models").join("latent_model.json"));
    assert!(!store.exists());

    let trained = store.load_or_train(&catalog(), LatentParams::new(3, 42)).unwrap();
    assert!(store.exists());
    let loaded = store.load_or_train(&catalog(), LatentParams::new(3, 42)).unwrap();
    assert_eq!(trained, loaded);
}

#[test]
fn raw_matrix_training_and_query() {
    let catalog = catalog();
    let matrix = catalog.requirement_matrix(ProficiencyScale::Unit);
    let model = train_latent_model(
        matrix,
        catalog.course_codes(),
        catalog.vocabulary().clone(),
        3,
        42,
    )
    .unwrap();

    let ranked = query_latent_model(&model, &sample_skills(), 3);
    assert_eq!(ranked.len(), 3);
    assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));
    assert!(ranked.iter().all(|(_, pct)| (0.0..=100.0).contains(pct)));
}

#[test]
fn repository_swaps_whole_snapshots() {
    let repository = CatalogRepository::new(catalog());
    let before = repository.snapshot();

    repository
        .update_course_skill("INTPROG", "Rust", ProficiencyLevel::Beginner)
        .unwrap();
    let after = repository.snapshot();

    assert!(!before.get("INTPROG").unwrap().requires("Rust"));
    assert!(after.get("INTPROG").unwrap().requires("Rust"));
    assert!(after.vocabulary().index_of("rust").is_some());
}

#[test]
fn graph_suggestions_and_paths_from_catalog() {
    let catalog = Arc::new(catalog());
    let mut graph = SkillGraph::from_catalog(&catalog);
    graph.initialize_common_relationships();

    let skills = SkillSet::new().with("HTML", ProficiencyLevel::Advanced);
    let suggestions = suggest_next_skills(&graph, &skills, 3);
    assert_eq!(suggestions.len(), 3);
    assert!(suggestions.iter().all(|s| s.skill != "HTML"));
    assert!(suggestions.windows(2).all(|w| w[0].relevance >= w[1].relevance));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("skill_graph.json");
    graph.save(&path).unwrap();
    assert_eq!(SkillGraph::load(&path).unwrap(), graph);

    let planner = LearningPathPlanner::new(catalog, graph);
    let steps = planner.generate_learning_path(&skills, Some("WEBFRAME"), 5);
    assert_eq!(steps.first().map(|s| s.course_code.as_str()), Some("WEBDEVT"));
    assert_eq!(steps.last().map(|s| s.course_code.as_str()), Some("WEBFRAME"));
}
