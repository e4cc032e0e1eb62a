//! End-to-end brainstorm flow against a mock Azure deployment.

use triad_core::{MethodText, Phase, Speaker, UiEvent};
use triad_types::MethodIndex;
use wiremock::MockServer;

use crate::common::{
    METHODS_REPLY, controller, messages, mount_error, mount_reply, request_bodies,
};

#[tokio::test]
async fn generate_select_followup_and_chat() {
    let server = MockServer::start().await;
    mount_reply(&server, METHODS_REPLY).await;
    mount_reply(&server, "Stream rows through a BTreeSet keyed by the row hash.").await;
    mount_reply(&server, "Persist the set in SQLite between runs.").await;

    let mut session = controller(&server);
    session
        .dispatch(UiEvent::SubmitProblem(
            "Remove duplicates from a daily CSV".to_string(),
        ))
        .await
        .unwrap();
    session
        .dispatch(UiEvent::TriggerGenerateMethods)
        .await
        .unwrap();

    let methods = session.state().methods().unwrap();
    assert_eq!(methods.generated_count(), 3);
    assert!(
        methods
            .get(MethodIndex::B)
            .text()
            .unwrap()
            .starts_with("2. MethodB: Sort and merge")
    );

    session
        .dispatch(UiEvent::SelectMethod(MethodIndex::A))
        .await
        .unwrap();
    session.dispatch(UiEvent::TriggerFollowup).await.unwrap();
    session
        .dispatch(UiEvent::SubmitChatMessage(
            "What if it runs every day?".to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(session.state().phase(), Phase::Chatting);
    let transcript = session.state().transcript(MethodIndex::A);
    let speakers: Vec<Speaker> = transcript.turns().iter().map(|t| t.speaker).collect();
    assert_eq!(
        speakers,
        vec![Speaker::Assistant, Speaker::User, Speaker::Assistant]
    );
    assert!(transcript.is_followup(0));
    assert!(session.last_error().is_none());

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies.len(), 3);

    let generate = messages(&bodies[0]);
    assert_eq!(generate.len(), 2);
    assert_eq!(generate[0].0, "system");
    assert!(generate[1].1.contains("Remove duplicates from a daily CSV"));
    assert!(generate[1].1.contains("2. MethodB:"));
    assert_eq!(bodies[0]["max_tokens"], 1000);
    assert!(bodies[0].get("model").is_none());

    let followup = messages(&bodies[1]);
    assert!(followup[1].1.contains("1. MethodA: Hash set"));
    assert!(!followup[1].1.contains("MethodB"));
    assert_eq!(bodies[1]["max_tokens"], 2000);

    let chat = messages(&bodies[2]);
    let roles: Vec<&str> = chat.iter().map(|(role, _)| role.as_str()).collect();
    assert_eq!(roles, vec!["system", "system", "assistant", "user"]);
    assert!(chat[1].1.contains("1. MethodA: Hash set"));
    assert_eq!(chat[3].1, "What if it runs every day?");
    assert_eq!(bodies[2]["max_tokens"], 1500);
}

#[tokio::test]
async fn threads_stay_separate_across_selection() {
    let server = MockServer::start().await;
    mount_reply(&server, METHODS_REPLY).await;
    mount_reply(&server, "answer about A").await;
    mount_reply(&server, "answer about C").await;
    mount_reply(&server, "second answer about A").await;

    let mut session = controller(&server);
    session.submit_problem("dedupe");
    session.generate_methods().await.unwrap();

    session.select_method(MethodIndex::A).unwrap();
    session.send_chat_turn("first A question").await.unwrap();
    session.select_method(MethodIndex::C).unwrap();
    session.send_chat_turn("C question").await.unwrap();
    session.select_method(MethodIndex::A).unwrap();
    session.send_chat_turn("second A question").await.unwrap();

    assert_eq!(session.state().transcript(MethodIndex::A).len(), 4);
    assert_eq!(session.state().transcript(MethodIndex::C).len(), 2);
    assert!(session.state().transcript(MethodIndex::B).is_empty());

    let bodies = request_bodies(&server).await;
    let last = messages(&bodies[3]);
    let contents: Vec<&str> = last.iter().map(|(_, content)| content.as_str()).collect();
    assert!(contents.contains(&"first A question"));
    assert!(!contents.contains(&"C question"));
    assert!(last[1].1.contains("1. MethodA"));
}

#[tokio::test]
async fn regenerating_resets_selection_and_threads() {
    let server = MockServer::start().await;
    mount_reply(&server, METHODS_REPLY).await;
    mount_reply(&server, "reply").await;
    mount_reply(&server, "1. MethodA: only one this time").await;

    let mut session = controller(&server);
    session.submit_problem("first problem");
    session.generate_methods().await.unwrap();
    session.select_method(MethodIndex::B).unwrap();
    session.send_chat_turn("q").await.unwrap();

    session.submit_problem("second problem");
    session.generate_methods().await.unwrap();

    let state = session.state();
    assert_eq!(state.phase(), Phase::MethodsGenerated);
    assert_eq!(state.selected(), None);
    assert!(state.transcript(MethodIndex::B).is_empty());
    let methods = state.methods().unwrap();
    assert_eq!(methods.generated_count(), 1);
    assert_eq!(methods.get(MethodIndex::C), &MethodText::NotGenerated);
    assert_eq!(state.generated().unwrap().problem.as_str(), "second problem");
}

#[tokio::test]
async fn failed_chat_turn_leaves_transcript_untouched() {
    let server = MockServer::start().await;
    mount_reply(&server, METHODS_REPLY).await;
    mount_error(&server, 500, "upstream exploded").await;

    let mut session = controller(&server);
    session.submit_problem("dedupe");
    session.generate_methods().await.unwrap();
    session.select_method(MethodIndex::A).unwrap();

    let err = session.send_chat_turn("will this work?").await.unwrap_err();
    assert!(!err.is_validation());
    assert!(session.state().transcript(MethodIndex::A).is_empty());
    assert_eq!(session.state().phase(), Phase::MethodSelected);

    let notice = session.last_error().unwrap();
    assert!(notice.message.contains("500"));
    assert!(notice.message.contains("upstream exploded"));
}

#[tokio::test]
async fn problem_edits_after_generation_do_not_leak_into_followup() {
    let server = MockServer::start().await;
    mount_reply(&server, METHODS_REPLY).await;
    mount_reply(&server, "details").await;

    let mut session = controller(&server);
    session.submit_problem("problem as generated");
    session.generate_methods().await.unwrap();
    session.submit_problem("edited but not regenerated");
    session.select_method(MethodIndex::C).unwrap();
    session.request_followup().await.unwrap();

    let bodies = request_bodies(&server).await;
    let followup = messages(&bodies[1]);
    assert!(followup[1].1.contains("problem as generated"));
    assert!(!followup[1].1.contains("edited but not regenerated"));
}
