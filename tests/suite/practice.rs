//! Practice flow: generated problems and feedback over HTTP.

use triad_core::{ProblemSource, SAMPLE_PROBLEMS};
use wiremock::MockServer;

use crate::common::{controller, messages, mount_reply, request_bodies};

#[tokio::test]
async fn generated_problem_is_cleaned_and_used_for_feedback() {
    let server = MockServer::start().await;
    mount_reply(&server, "\"Count islands in a grid\"").await;
    mount_reply(&server, "Good decomposition. What about diagonal neighbours?").await;

    let mut session = controller(&server);
    session.generate_practice_problem().await.unwrap();
    assert_eq!(session.practice().source(), ProblemSource::Generated);
    assert_eq!(
        session.practice().generated_problem(),
        Some("Count islands in a grid")
    );

    session
        .request_practice_feedback("flood fill each unvisited land cell", "linear time")
        .await
        .unwrap();
    assert_eq!(
        session.practice().feedback(),
        Some("Good decomposition. What about diagonal neighbours?")
    );

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies[0]["max_tokens"], 200);
    assert_eq!(bodies[1]["max_tokens"], 800);
    let feedback = messages(&bodies[1]);
    assert!(feedback[1].1.starts_with("Problem: Count islands in a grid\n"));
    assert!(feedback[1].1.contains("Skip any commentary on the problem itself."));
}

#[tokio::test]
async fn custom_problem_invites_commentary() {
    let server = MockServer::start().await;
    mount_reply(&server, "Nice.").await;

    let mut session = controller(&server);
    session
        .practice_mut()
        .set_custom_problem("Merge overlapping meetings");
    session
        .request_practice_feedback("sort by start", "so overlaps are adjacent")
        .await
        .unwrap();

    let bodies = request_bodies(&server).await;
    let feedback = messages(&bodies[0]);
    assert!(feedback[1].1.contains("Problem: Merge overlapping meetings"));
    assert!(!feedback[1].1.contains("Skip any commentary"));
}

#[tokio::test]
async fn incomplete_practice_input_never_calls_the_model() {
    let server = MockServer::start().await;

    let mut session = controller(&server);
    let err = session
        .request_practice_feedback("", "because")
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(session.practice().active_problem().unwrap().text, SAMPLE_PROBLEMS[0]);
    assert!(session.practice().feedback().is_none());
    assert!(request_bodies(&server).await.is_empty());
}
