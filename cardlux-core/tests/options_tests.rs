use cardlux_core::{
    build_choices_with_rng, Card, CardKind, CoreError, Difficulty, Direction, Register,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

fn vocab(topic: Uuid, front: &str, back: &str, difficulty: Difficulty) -> Card {
    Card::new(topic, front, back, difficulty, CardKind::Vocabulary)
}

fn phrase(topic: Uuid, front: &str, back: &str) -> Card {
    Card::new(
        topic,
        front,
        back,
        Difficulty::Advanced,
        CardKind::Phrase {
            register: Register::Neutral,
        },
    )
}

#[test]
fn choices_hold_one_correct_answer_across_random_trials() {
    let topic = Uuid::new_v4();
    let target = vocab(topic, "Haus", "house", Difficulty::Beginner);
    let pool = vec![
        target.clone(),
        vocab(topic, "Kaz", "cat", Difficulty::Beginner),
        vocab(topic, "Hond", "dog", Difficulty::Beginner),
        vocab(topic, "Buch", "book", Difficulty::Beginner),
    ];

    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..1000 {
        let choices =
            build_choices_with_rng(&target, &pool, Direction::FrontToBack, 2, &mut rng)
                .expect("enough distractors");
        assert_eq!(choices.options.len(), 3);
        assert_eq!(
            choices.options.iter().filter(|o| *o == "house").count(),
            1
        );
        assert_eq!(choices.options[choices.correct_index], "house");
        assert_eq!(choices.correct_answer, "house");

        let mut distinct = choices.options.clone();
        distinct.sort();
        distinct.dedup();
        assert_eq!(distinct.len(), 3);
    }
}

#[test]
fn one_eligible_distractor_is_insufficient() {
    let topic = Uuid::new_v4();
    let target = vocab(topic, "Haus", "house", Difficulty::Beginner);
    let pool = vec![
        target.clone(),
        vocab(topic, "Kaz", "cat", Difficulty::Beginner),
    ];

    let mut rng = StdRng::seed_from_u64(7);
    let err = build_choices_with_rng(&target, &pool, Direction::FrontToBack, 2, &mut rng)
        .expect_err("only one distractor available");
    match err {
        CoreError::InsufficientOptions { needed, found } => {
            assert_eq!(needed, 2);
            assert_eq!(found, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn same_topic_same_difficulty_tier_wins() {
    let topic = Uuid::new_v4();
    let other_topic = Uuid::new_v4();
    let target = vocab(topic, "Haus", "house", Difficulty::Beginner);
    let pool = vec![
        target.clone(),
        vocab(topic, "Kaz", "cat", Difficulty::Beginner),
        vocab(topic, "Hond", "dog", Difficulty::Beginner),
        vocab(other_topic, "Waasser", "water", Difficulty::Intermediate),
        vocab(other_topic, "Brout", "bread", Difficulty::Intermediate),
    ];

    let mut rng = StdRng::seed_from_u64(42);
    let choices =
        build_choices_with_rng(&target, &pool, Direction::FrontToBack, 2, &mut rng).unwrap();
    assert!(choices.options.contains(&"cat".to_string()));
    assert!(choices.options.contains(&"dog".to_string()));
    assert!(!choices.options.contains(&"water".to_string()));
}

#[test]
fn cascade_widens_when_first_tier_is_thin() {
    let topic = Uuid::new_v4();
    let other_topic = Uuid::new_v4();
    let target = vocab(topic, "Haus", "house", Difficulty::Beginner);
    let pool = vec![
        target.clone(),
        vocab(topic, "Kaz", "cat", Difficulty::Beginner),
        vocab(other_topic, "Brout", "bread", Difficulty::Beginner),
    ];

    let mut rng = StdRng::seed_from_u64(1);
    let choices =
        build_choices_with_rng(&target, &pool, Direction::FrontToBack, 2, &mut rng).unwrap();
    assert!(choices.options.contains(&"cat".to_string()));
    assert!(choices.options.contains(&"bread".to_string()));
}

#[test]
fn phrase_options_never_borrow_from_vocabulary() {
    let topic = Uuid::new_v4();
    let target = phrase(topic, "Wéi geet et?", "How are you?");
    let pool = vec![
        target.clone(),
        vocab(topic, "Kaz", "cat", Difficulty::Beginner),
        vocab(topic, "Hond", "dog", Difficulty::Beginner),
        phrase(topic, "Gudde Moien", "Good morning"),
    ];

    let mut rng = StdRng::seed_from_u64(3);
    let err = build_choices_with_rng(&target, &pool, Direction::FrontToBack, 2, &mut rng)
        .expect_err("only one phrase distractor exists");
    assert!(matches!(
        err,
        CoreError::InsufficientOptions { needed: 2, found: 1 }
    ));
}

#[test]
fn suspended_and_duplicate_answers_are_skipped() {
    let topic = Uuid::new_v4();
    let target = vocab(topic, "Haus", "house", Difficulty::Beginner);
    let mut suspended = vocab(topic, "Kaz", "cat", Difficulty::Beginner);
    suspended.suspended = true;
    let pool = vec![
        target.clone(),
        suspended,
        // Same answer text as the target, distinct card.
        vocab(topic, "Heem", "house", Difficulty::Beginner),
        vocab(topic, "Hond", "dog", Difficulty::Beginner),
    ];

    let mut rng = StdRng::seed_from_u64(11);
    let err = build_choices_with_rng(&target, &pool, Direction::FrontToBack, 2, &mut rng)
        .expect_err("dog is the only usable distractor");
    assert!(matches!(
        err,
        CoreError::InsufficientOptions { needed: 2, found: 1 }
    ));
}
