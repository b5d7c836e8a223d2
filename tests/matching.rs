use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

use skill_match::{
    build_skill_vector, rank_courses, score_course, Calibration, Catalog, Course, DirectScorer,
    HybridWeights, LatentModel, LatentParams, MatchingStrategy, ProficiencyLevel, Ranker,
    SkillProficiency, SkillSet, StrategyKind,
};

fn catalog() -> Catalog {
    Catalog::from_json_str(include_str!("../data/course_skills.json")).unwrap()
}

fn intprog() -> Course {
    Course::new("INTPROG", "Introduction to Programming")
        .with_requirement("Python", ProficiencyLevel::Intermediate)
        .with_requirement("Problem Solving", ProficiencyLevel::Intermediate)
}

#[test]
fn expert_python_with_unrelated_requirement() {
    let skills = SkillSet::new().with("Python", ProficiencyLevel::Expert);

    let strict = DirectScorer::new(Calibration::strict()).match_course(&skills, &intprog());
    assert!((strict.match_percentage - 50.0).abs() < 1e-9);

    let default = score_course(&skills, &intprog());
    assert!((default.match_percentage - 62.0).abs() < 1e-9);

    for result in [&strict, &default] {
        assert_eq!(result.matched_names().collect::<Vec<_>>(), vec!["Python"]);
        assert_eq!(result.missing_names().collect::<Vec<_>>(), vec!["Problem Solving"]);
    }
}

#[test]
fn empty_skill_set_misses_everything() {
    let catalog = catalog();
    for course in catalog.courses() {
        let result = score_course(&SkillSet::new(), course);
        assert_eq!(result.match_percentage, 0.0);
        assert!(result.matched_skills.is_empty());
        assert_eq!(result.missing_skills.len(), course.requirements().len());
    }
}

#[test]
fn course_without_requirements_scores_zero() {
    let skills = SkillSet::new().with("Python", ProficiencyLevel::Expert);
    let result = score_course(&skills, &Course::new("SEMINAR", "Seminar"));
    assert_eq!(result.match_percentage, 0.0);
    assert!(result.missing_skills.is_empty());
}

#[test]
fn substring_similarity_is_partial_credit() {
    let skills = SkillSet::new().with("MySQL", ProficiencyLevel::Intermediate);
    let course = Course::new("DB", "Databases").with_requirement("SQL", ProficiencyLevel::Intermediate);

    let scorer = DirectScorer::default();
    let held = SkillProficiency::new("MySQL", ProficiencyLevel::Intermediate);
    let (score, exact) = scorer.score(&held, "SQL", ProficiencyLevel::Intermediate);
    assert!((score - 0.8).abs() < 1e-12);
    assert!(!exact);

    let result = scorer.match_course(&skills, &course);
    assert!((result.match_percentage - 71.6).abs() < 1e-9);
    assert_eq!(result.matched_names().collect::<Vec<_>>(), vec!["SQL"]);
}

#[test]
fn latent_training_is_reproducible() {
    let catalog = catalog();
    let a = LatentModel::train(&catalog, LatentParams::new(3, 42)).unwrap();
    let b = LatentModel::train(&catalog, LatentParams::new(3, 42)).unwrap();
    assert_eq!(a.course_factors(), b.course_factors());
    assert_eq!(a.skill_factors(), b.skill_factors());
}

#[test]
fn course_similarity_is_symmetric() {
    let model = LatentModel::train(&catalog(), LatentParams::new(3, 42)).unwrap();
    let codes = model.course_codes().to_vec();
    for a in &codes {
        for b in &codes {
            let ab = model.course_similarity(a, b).unwrap();
            let ba = model.course_similarity(b, a).unwrap();
            assert!((ab - ba).abs() < 1e-12);
        }
    }
}

#[test]
fn exact_match_ignores_case() {
    let scorer = DirectScorer::default();
    for level in ProficiencyLevel::ALL {
        let held = SkillProficiency::new("python", ProficiencyLevel::Expert);
        let (score, exact) = scorer.score(&held, "PYTHON", level);
        assert_eq!(score, 1.0);
        assert!(exact);
    }
}

#[test]
fn skill_vector_covers_vocabulary() {
    let catalog = catalog();
    let skills = SkillSet::new()
        .with_certified("python", ProficiencyLevel::Advanced)
        .with("Underwater Basket Weaving", ProficiencyLevel::Expert);

    let vector = build_skill_vector(&skills, catalog.vocabulary());
    assert_eq!(vector.len(), catalog.vocabulary().len());
    let idx = catalog.vocabulary().index_of("Python").unwrap();
    assert_eq!(vector.as_slice()[idx], 1.0);
    assert_eq!(vector.as_slice().iter().filter(|v| **v > 0.0).count(), 1);
}

#[test]
fn every_strategy_ranks_deterministically() {
    let catalog = Arc::new(catalog());
    let model = Arc::new(LatentModel::train(&catalog, LatentParams::new(3, 42)).unwrap());
    let skills = SkillSet::new()
        .with("HTML", ProficiencyLevel::Advanced)
        .with("JavaScript", ProficiencyLevel::Intermediate)
        .with("Python", ProficiencyLevel::Beginner);

    let strategies = [
        MatchingStrategy::default(),
        MatchingStrategy::latent(model.clone()),
        MatchingStrategy::hybrid(model, DirectScorer::default(), HybridWeights::default()),
    ];
    for strategy in strategies {
        let ranker = Ranker::new(catalog.clone(), strategy);
        let first = ranker.recommend(&skills, 4).unwrap();
        let second = ranker.recommend(&skills, 4).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
        assert!(first.windows(2).all(|w| w[0].match_percentage >= w[1].match_percentage));
        if ranker.strategy().kind() == StrategyKind::Direct {
            assert_eq!(first[0].course_code, "WEBDEVT");
        }
    }
}

fn arb_level() -> impl Strategy<Value = ProficiencyLevel> {
    prop::sample::select(ProficiencyLevel::ALL.to_vec())
}

fn arb_skills() -> impl Strategy<Value = SkillSet> {
    let names = prop::sample::select(vec![
        "Python", "SQL", "MySQL", "HTML", "css", "React", "Problem Solving", "Cooking", "",
    ]);
    prop::collection::vec((names, arb_level(), any::<bool>()), 0..6).prop_map(|entries| {
        let mut set = SkillSet::new();
        for (name, level, certified) in entries {
            set = if certified {
                set.with_certified(name, level)
            } else {
                set.with(name, level)
            };
        }
        set
    })
}

proptest! {
    #[test]
    fn breakdown_partitions_requirements(skills in arb_skills()) {
        let catalog = catalog();
        for result in rank_courses(&skills, catalog.courses(), usize::MAX) {
            let course = catalog.get(&result.course_code).unwrap();
            let expected: BTreeSet<&str> = course.skill_names().collect();
            let matched: BTreeSet<&str> = result.matched_names().collect();
            let missing: BTreeSet<&str> = result.missing_names().collect();

            prop_assert!(matched.is_disjoint(&missing));
            prop_assert_eq!(matched.len() + missing.len(), course.requirements().len());
            let union: BTreeSet<&str> = matched.union(&missing).copied().collect();
            prop_assert_eq!(union, expected);
        }
    }

    #[test]
    fn percentages_stay_in_bounds(skills in arb_skills(), level in arb_level()) {
        let single = Course::new("ONE", "One").with_requirement("Python", level);
        let result = score_course(&skills, &single);
        prop_assert!((0.0..=100.0).contains(&result.match_percentage));

        for result in rank_courses(&skills, catalog().courses(), 10) {
            prop_assert!((0.0..=100.0).contains(&result.match_percentage));
        }
    }
}
