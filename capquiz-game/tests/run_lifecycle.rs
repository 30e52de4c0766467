use capquiz_game::{
    CountPolicy, CountryData, GuessOutcome, QuizMode, QuizSession, ReplaySelection, RunConfig,
    RunPhase, Scope,
};
use std::collections::HashSet;
use std::rc::Rc;

const SEED: u64 = 0xCAB5;
const T0: u64 = 10_000;

fn dataset() -> Rc<CountryData> {
    let json = r#"[
        {"id": "A", "name": "Aland", "aliases": ["Alandia"],
         "continents": ["Europe"], "groups": [],
         "capitals": [{"name": "Alpha City", "lat": 0.0, "lon": 0.0}]},
        {"id": "B", "name": "Betaria", "aliases": [],
         "continents": ["Europe"], "groups": [],
         "capitals": [{"name": "Beta Town", "lat": 0.0, "lon": 10.0}]},
        {"id": "C", "name": "Gammaland", "aliases": [],
         "continents": ["Asia"], "groups": [],
         "capitals": [{"name": "Gamma Port", "lat": 0.0, "lon": 20.0}]}
    ]"#;
    Rc::new(CountryData::from_json(json).unwrap())
}

fn start(mode: QuizMode, count: CountPolicy) -> QuizSession {
    let config = RunConfig::new(mode, Scope::World, count);
    QuizSession::new(dataset(), config, SEED, T0).unwrap()
}

fn current_capital(session: &QuizSession) -> String {
    session.current().unwrap().capital.unwrap().name.clone()
}

#[test]
fn end_to_end_country_to_capital() {
    let mut session = start(QuizMode::CountryToCapital, CountPolicy::All);
    assert_eq!(session.phase(), RunPhase::Active);
    assert_eq!(session.pending(), Some(3));

    // A capital that belongs to a country which is not currently prompted is
    // a genuine mistake; the queue does not move.
    let current_id = session.current().unwrap().country.id.clone();
    let other_capital = if current_id == "B" { "gamma port" } else { "beta town" };
    assert_eq!(
        session.submit_guess(other_capital, T0 + 1),
        Some(GuessOutcome::Wrong)
    );
    assert_eq!(session.state().wrong_count, 1);
    assert_eq!(session.pending(), Some(3));
    assert_eq!(session.current().unwrap().country.id, current_id);

    // Three correct answers in sequence exhaust the queue and finish the run.
    for step in 0..3 {
        let answer = current_capital(&session);
        assert_eq!(
            session.submit_guess(&answer, T0 + 10 + step),
            Some(GuessOutcome::Correct)
        );
    }
    assert_eq!(session.state().correct_count, 3);
    assert_eq!(session.state().queue.len(), 0);
    assert_eq!(session.phase(), RunPhase::Evaluation);
    assert_eq!(session.state().wrong_count, 1);
    assert_eq!(session.state().wrong_set.len(), 1);
    assert!(session.state().is_finished());
}

#[test]
fn empty_guess_is_a_no_op() {
    let mut session = start(QuizMode::CountryToCapital, CountPolicy::All);
    let before = session.state().clone();

    assert_eq!(session.submit_guess("", T0 + 1), None);
    assert_eq!(session.submit_guess("   ", T0 + 2), None);
    assert_eq!(session.submit_guess("\t ?! ", T0 + 3), None);

    assert_eq!(session.state(), &before);
}

#[test]
fn skips_cycle_through_the_whole_queue() {
    let mut session = start(QuizMode::CountryToCapital, CountPolicy::All);
    let first = session.current().unwrap().country.id.clone();

    for _ in 0..3 {
        assert!(session.skip());
    }

    // Pigeonhole: after n skips the original front prompt is current again.
    assert_eq!(session.current().unwrap().country.id, first);
    assert_eq!(session.pending(), Some(3));
    assert_eq!(session.state().skipped_count, 3);
    assert_eq!(session.state().skipped_set.len(), 3);
    assert_eq!(session.phase(), RunPhase::Active);
}

#[test]
fn abort_records_remaining_prompts_as_skipped() {
    let mut session = start(QuizMode::CountryToCapital, CountPolicy::All);

    let answer = current_capital(&session);
    assert_eq!(
        session.submit_guess(&answer, T0 + 1),
        Some(GuessOutcome::Correct)
    );

    session.abort(T0 + 2);
    assert_eq!(session.phase(), RunPhase::Evaluation);
    assert_eq!(session.state().skipped_count, 2);
    assert_eq!(session.state().skipped_set.len(), 2);
    assert!(session.state().is_finished());

    // Aborting again is inert.
    let snapshot = session.state().clone();
    session.abort(T0 + 50);
    assert_eq!(session.state(), &snapshot);
}

#[test]
fn abort_dedups_against_earlier_skips() {
    let mut session = start(QuizMode::CountryToCapital, CountPolicy::All);

    assert!(session.skip());
    assert_eq!(session.state().skipped_count, 1);

    session.abort(T0 + 5);
    // The earlier skip shows up again in the bulk pass: counted twice,
    // listed once.
    assert_eq!(session.state().skipped_count, 4);
    assert_eq!(session.state().skipped_set.len(), 3);
}

#[test]
fn rerun_from_mistakes_and_skips_seeds_exactly_those_countries() {
    let mut session = start(QuizMode::CountryToCapital, CountPolicy::All);
    let mut wronged_b = false;
    let mut skipped_c = false;

    while session.phase() == RunPhase::Active {
        let id = session.current().unwrap().country.id.clone();
        if id == "B" && !wronged_b {
            assert_eq!(session.submit_guess("xyzzy", T0), Some(GuessOutcome::Wrong));
            wronged_b = true;
        } else if id == "C" && !skipped_c {
            assert!(session.skip());
            skipped_c = true;
        } else {
            let answer = current_capital(&session);
            assert_eq!(
                session.submit_guess(&answer, T0),
                Some(GuessOutcome::Correct)
            );
        }
    }

    assert_eq!(session.replay_ids(ReplaySelection::Wrong), vec!["B"]);
    assert_eq!(session.replay_ids(ReplaySelection::Skipped), vec!["C"]);

    let union: HashSet<String> = session
        .replay_ids(ReplaySelection::Union)
        .into_iter()
        .collect();
    assert_eq!(union, HashSet::from(["B".to_string(), "C".to_string()]));

    let rerun = session.rerun(ReplaySelection::Union, SEED + 1, T0 + 100).unwrap();
    assert_eq!(rerun.phase(), RunPhase::Active);
    assert_eq!(rerun.pending(), Some(2));
    assert!(!rerun.config().count.is_infinite());
    let ids: HashSet<String> = rerun
        .state()
        .queue
        .iter()
        .map(|p| p.country_id.clone())
        .collect();
    assert_eq!(ids, union);
    // Fresh state, not a mutation of the old run.
    assert_eq!(rerun.state().correct_count, 0);
    assert_eq!(rerun.state().skipped_count, 0);

    let wrong_only = session.rerun(ReplaySelection::Wrong, SEED + 2, T0 + 100).unwrap();
    assert_eq!(wrong_only.pending(), Some(1));
}

#[test]
fn rerun_with_nothing_recorded_is_refused() {
    let mut session = start(QuizMode::CountryToCapital, CountPolicy::All);
    while session.phase() == RunPhase::Active {
        let answer = current_capital(&session);
        session.submit_guess(&answer, T0).unwrap();
    }
    assert!(session.rerun(ReplaySelection::Wrong, SEED, T0).is_err());
}

#[test]
fn finish_time_is_set_once_and_freezes_elapsed() {
    let mut session = start(QuizMode::CountryToCapital, CountPolicy::All);
    for _ in 0..3 {
        let answer = current_capital(&session);
        session.submit_guess(&answer, T0 + 7_000).unwrap();
    }
    assert_eq!(session.state().finished_at_ms, Some(T0 + 7_000));

    let summary = session.summary(T0 + 99_000);
    assert_eq!(summary.elapsed_ms, 7_000);
    assert_eq!(summary.elapsed_display(), "00:00:07");
    assert_eq!(summary.correct, 3);
}

#[test]
fn reveal_routes_union_into_table_display() {
    let mut session = start(QuizMode::CountryToCapital, CountPolicy::All);
    assert!(session.skip());
    session.abort(T0 + 1);

    let table = session.reveal(SEED, T0 + 2).unwrap();
    assert_eq!(table.phase(), RunPhase::Table);
    assert_eq!(table.config().mode, QuizMode::Table);
    assert_eq!(table.table_rows().len(), 3);
    // Browse state is not scored.
    assert_eq!(table.state().correct_count, 0);
}
