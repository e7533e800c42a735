use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use proptest::prelude::*;
use tower::ServiceExt;

use crate::api::{create_router, AppState, MAC_HEADER, VERSION_HEADER};
use crate::firmware::{FirmwareImage, UpdateDecision};

fn header_text() -> impl Strategy<Value = String> {
    // Visible ASCII, valid as a header value
    "[ -~]{0,24}"
}

proptest! {
    #[test]
    fn decision_is_string_equality(reported in header_text(), target in "[ -~]{1,24}") {
        let decision = UpdateDecision::for_version(reported.as_bytes(), &target);
        prop_assert_eq!(decision == UpdateDecision::UpToDate, reported == target);
    }

    #[test]
    fn target_always_matches_itself(target in "[ -~]{1,24}") {
        prop_assert_eq!(
            UpdateDecision::for_version(target.as_bytes(), &target),
            UpdateDecision::UpToDate
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    // The MAC header is logged only: status and body never depend on it.
    #[test]
    fn mac_header_never_changes_response(
        version in prop_oneof![Just("0.03".to_string()), header_text()],
        mac in "[0-9A-F]{2}(:[0-9A-F]{2}){5}",
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("net_restart.ino.d32.bin");
        std::fs::write(&path, b"image").unwrap();
        let router = create_router(AppState::new(FirmwareImage::new(path).unwrap(), "0.03"));

        let (with_mac, without_mac) = rt.block_on(async {
            let mut outcomes = Vec::new();
            for mac in [Some(mac.as_str()), None] {
                let mut builder = Request::builder()
                    .uri("/update")
                    .header(VERSION_HEADER, version.as_str());
                if let Some(mac) = mac {
                    builder = builder.header(MAC_HEADER, mac);
                }
                let resp = router
                    .clone()
                    .oneshot(builder.body(Body::empty()).unwrap())
                    .await
                    .unwrap();
                let status = resp.status();
                let body = to_bytes(resp.into_body(), 1024).await.unwrap();
                outcomes.push((status, body));
            }
            (outcomes.remove(0), outcomes.remove(0))
        });

        prop_assert_eq!(&with_mac, &without_mac);
        let expected = if version == "0.03" { StatusCode::NOT_MODIFIED } else { StatusCode::OK };
        prop_assert_eq!(with_mac.0, expected);
    }
}
