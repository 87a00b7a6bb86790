//! Integration tests for the mail library: wire payloads all the way to the
//! transport seam.

use mail::{
    DispatchError, EmailPayload, MailProcessor, MailService, MockMailer, Normalizer, Origin,
    DEFAULT_SUBJECT,
};
use queue_worker::Processor;
use std::sync::Arc;

mod request_path {
    use super::*;

    #[tokio::test]
    async fn test_request_without_subject_gets_the_placeholder() {
        let mock = Arc::new(MockMailer::new());
        let service = MailService::new(Normalizer::default(), mock.clone());

        let payload: EmailPayload = serde_json::from_str(
            r#"{"receiver_email": ["a@x.com", "b@y.com"], "message_text": "Hi"}"#,
        )
        .unwrap();

        let message = service.send(payload).await.unwrap();

        assert_eq!(message.subject, DEFAULT_SUBJECT);
        assert!(mock.was_delivered_to("a@x.com").await);
        assert!(mock.was_delivered_to("b@y.com").await);
    }

    #[tokio::test]
    async fn test_request_errors_carry_their_kind() {
        let mock = Arc::new(MockMailer::new());
        let service = MailService::new(Normalizer::default(), mock);

        let payload: EmailPayload =
            serde_json::from_str(r#"{"message_text": "Hi"}"#).unwrap();

        match service.send(payload).await {
            Err(DispatchError::Validation(err)) => {
                assert!(err.to_string().contains("receiver_email"));
            }
            other => panic!("Expected a validation error, got {:?}", other.map(|m| m.subject)),
        }
    }
}

mod queue_path {
    use super::*;

    #[tokio::test]
    async fn test_queue_payload_flows_to_the_transport() {
        let mock = Arc::new(MockMailer::new());
        let processor = MailProcessor::new(Normalizer::default(), mock.clone(), Origin::Kafka);

        processor
            .process(
                br#"{"receiver_email": "user@example.com", "email_object": "Welcome", "message_text": "<h1>Hello</h1>"}"#,
            )
            .await
            .unwrap();

        let delivered = mock.delivered().await;
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].subject, "Welcome");
        assert_eq!(delivered[0].body_html, "<h1>Hello</h1>");
    }

    #[tokio::test]
    async fn test_incomplete_queue_payload_never_reaches_the_transport() {
        let mock = Arc::new(MockMailer::new());
        let processor = MailProcessor::new(Normalizer::default(), mock.clone(), Origin::Amqp);

        // Missing subject and body.
        let result = processor.process(br#"{"receiver_email": "a@x.com"}"#).await;

        assert!(result.is_err());
        assert_eq!(mock.delivered_count().await, 0);
    }

    #[tokio::test]
    async fn test_both_queue_origins_share_the_validation_rules() {
        for origin in [Origin::Kafka, Origin::Amqp] {
            let mock = Arc::new(MockMailer::new());
            let processor = MailProcessor::new(Normalizer::default(), mock.clone(), origin);

            // No subject: rejected for queue origins, unlike the request path.
            let result = processor
                .process(br#"{"receiver_email": "a@x.com", "message_text": "Hi"}"#)
                .await;

            assert!(result.is_err(), "origin {} accepted a subjectless payload", origin);
            assert_eq!(mock.delivered_count().await, 0);
        }
    }
}
