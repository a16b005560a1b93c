use chrono::Duration;
use radio_core::model::{
    AnswerOption, Callsign, CategoryId, GameHistoryRecord, ManualPage, OptionId, PageId,
    QuestionCategory, QuestionType, QuestionVariant, RankId, VariantId,
};
use radio_core::ptt::{GestureOutcome, PttGesture, SPOKE_TOO_SOON};
use radio_core::time::{fixed_clock, fixed_now};
use services::{
    AdminGate, AppServices, RankSelection, SessionEvent, SessionPhase, TrainingSession,
};
use std::sync::{Arc, Mutex};
use storage::Storage;

fn option(id: &str, correct: bool) -> AnswerOption {
    AnswerOption {
        id: OptionId::new(id),
        text: format!("{id} from {{CALLSIGN}}"),
        is_correct: correct,
        feedback: if correct { "Copy.".into() } else { "Say again.".into() },
    }
}

fn mc_category(n: u32) -> QuestionCategory {
    QuestionCategory {
        id: CategoryId::new(format!("CAT_{n}")),
        title: format!("Category {n}"),
        required_rank_id: RankId::new("R0"),
        variants: vec![QuestionVariant {
            id: VariantId::new(format!("CAT_{n}_A")),
            scenario: "Report to Base, {CALLSIGN}.".into(),
            kind: QuestionType::MultipleChoice,
            options: vec![option("right", true), option("wrong", false)],
            ptt_instruction: None,
        }],
    }
}

fn ptt_category() -> QuestionCategory {
    QuestionCategory {
        id: CategoryId::new("PTT"),
        title: "Push to talk".into(),
        required_rank_id: RankId::new("R1"),
        variants: vec![QuestionVariant {
            id: VariantId::new("PTT_A"),
            scenario: "Open the channel.".into(),
            kind: QuestionType::PttTiming,
            options: vec![option("say", true)],
            ptt_instruction: Some("Hold until the light turns green.".into()),
        }],
    }
}

fn pages() -> Vec<ManualPage> {
    (1..=2)
        .map(|n| ManualPage {
            id: PageId::new(n),
            title: format!("Lesson {n}"),
            icon_ref: "Radio".into(),
            content: "Keep it short.".into(),
            required_rank_id: RankId::new("R0"),
        })
        .collect()
}

async fn storage() -> Storage {
    let storage = Storage::in_memory();
    let mut bank: Vec<QuestionCategory> = (1..=5).map(mc_category).collect();
    bank.push(ptt_category());
    storage.content.save_question_bank(&bank).await.unwrap();
    storage.content.save_manual_pages(&pages()).await.unwrap();
    storage
}

fn callsign() -> Callsign {
    Callsign::new("Ilves").unwrap()
}

fn correct_id(session: &TrainingSession) -> OptionId {
    session
        .current_question()
        .and_then(|q| q.variant.correct_option())
        .map(|o| o.id.clone())
        .unwrap()
}

#[tokio::test]
async fn one_retry_still_passes_with_four_of_five() {
    let storage = storage().await;
    let app = AppServices::from_storage(&storage, fixed_clock(), AdminGate::default());
    app.users().register("Aino").await.unwrap();

    let reported = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reported);
    let mut session = app
        .training()
        .start_session("Aino", callsign(), RankSelection::Progression)
        .await
        .unwrap()
        .on_complete(move |result| sink.lock().unwrap().push(result));

    assert_eq!(session.status().progress_label, "1 / 2");
    assert_eq!(session.retreat().event, SessionEvent::ExitRequested);
    session.advance();
    let update = session.advance();
    assert_eq!(update.event, SessionEvent::QuizStarted { total: 5 });

    let mut answered = 0;
    while session.phase() == SessionPhase::Quiz {
        if answered == 2 {
            session.submit_answer(&OptionId::new("wrong"));
            assert_eq!(session.dismiss_feedback().event, SessionEvent::Retry);
        }
        let prompt = session.current_prompt().unwrap();
        assert_eq!(prompt.scenario, "Report to Base, Ilves.");
        let id = correct_id(&session);
        session.submit_answer(&id);
        session.advance();
        answered += 1;
    }

    let result = session.result().unwrap();
    assert_eq!((result.score, result.total), (4, 5));
    assert!(result.passed());
    assert_eq!(reported.lock().unwrap().len(), 1);

    let record = app.training().record_result("Aino", &mut session).await.unwrap();
    assert!(record.passed);
    assert_eq!(record.timestamp, fixed_now());

    let progress = app.training().progress_for("Aino").await.unwrap();
    assert_eq!(progress.passed_count, 1);
    assert_eq!(progress.current_rank.id.as_str(), "R1");

    let stats = app.admin().user_stats().await.unwrap();
    assert_eq!(stats[0].name, "Aino");
    assert_eq!(stats[0].favorite_callsign.as_deref(), Some("Ilves"));
}

#[tokio::test]
async fn four_passes_reach_top_rank() {
    let storage = storage().await;
    for _ in 0..4 {
        let record = GameHistoryRecord::completed("Eero", &callsign(), 5, 5, fixed_now()).unwrap();
        storage.history.append_game_result(&record).await.unwrap();
    }
    let app = AppServices::from_storage(&storage, fixed_clock(), AdminGate::default());

    let progress = app.training().progress_for("Eero").await.unwrap();
    assert_eq!(progress.passed_count, 4);
    assert_eq!(progress.current_rank.id.as_str(), "R3");
    assert!(progress.next_rank.is_none());
    assert!((progress.progress_percent - 100.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn held_gesture_answers_timing_question() {
    let storage = storage().await;
    let record = GameHistoryRecord::completed("Liisa", &callsign(), 5, 5, fixed_now()).unwrap();
    storage.history.append_game_result(&record).await.unwrap();
    let app = AppServices::from_storage(&storage, fixed_clock(), AdminGate::default());

    let mut session = app
        .training()
        .start_session("Liisa", callsign(), RankSelection::Progression)
        .await
        .unwrap();
    assert_eq!(session.rank().id.as_str(), "R1");
    assert!(matches!(session.skip_to_quiz().event, SessionEvent::QuizStarted { total: 1 }));

    let mut clock = fixed_clock();
    let mut gesture = PttGesture::new();

    gesture.press(clock.now());
    clock.advance(Duration::milliseconds(800));
    let early = gesture.release(clock.now()).unwrap();
    assert_eq!(early, GestureOutcome::failure(SPOKE_TOO_SOON));
    let update = session.submit_timed_gesture(early);
    assert!(matches!(update.event, SessionEvent::Answered(ref f) if f.message == SPOKE_TOO_SOON));
    assert_eq!(session.dismiss_feedback().event, SessionEvent::Retry);

    gesture.press(clock.now());
    clock.advance(Duration::milliseconds(1300));
    let held = gesture.release(clock.now()).unwrap();
    assert!(held.is_success());
    session.submit_timed_gesture(held);
    session.advance();

    assert_eq!(session.phase(), SessionPhase::Complete);
    let result = session.result().unwrap();
    assert_eq!((result.score, result.total), (0, 1));
    assert!(!app.training().record_result("Liisa", &mut session).await.unwrap().passed);
}

#[tokio::test]
async fn review_mode_trains_an_earlier_rank() {
    let storage = storage().await;
    for _ in 0..2 {
        let record = GameHistoryRecord::completed("Aino", &callsign(), 5, 5, fixed_now()).unwrap();
        storage.history.append_game_result(&record).await.unwrap();
    }
    let app = AppServices::from_storage(&storage, fixed_clock(), AdminGate::default());

    let mut session = app
        .training()
        .start_session("Aino", callsign(), RankSelection::Review(RankId::new("R0")))
        .await
        .unwrap();
    assert_eq!(session.pages().len(), 2);
    assert!(matches!(session.skip_to_quiz().event, SessionEvent::QuizStarted { total: 5 }));
    assert!(session.current_question().is_some());
}
