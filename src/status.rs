//! Device status as reported by a transport, and its caller-facing form.

use serde::Serialize;

/// Status flags as read from the device. `None` means the device did not
/// report that field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawStatus {
    pub cover_open: Option<bool>,
    pub paper_empty: Option<bool>,
    pub paper_near_empty: Option<bool>,
    pub drawer_open: Option<bool>,
}

/// Caller-facing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedStatus {
    pub online: bool,
    pub cover_open: bool,
    pub paper_empty: bool,
    pub paper_near_empty: bool,
    pub drawer_open: bool,
}

/// Normalize a raw status. Unreported fields count as `false`; the printer is
/// online when the cover is closed and paper is present.
pub fn map_status(raw: &RawStatus) -> NormalizedStatus {
    let flag = |f: Option<bool>| f == Some(true);
    let cover_open = flag(raw.cover_open);
    let paper_empty = flag(raw.paper_empty);
    NormalizedStatus {
        online: !cover_open && !paper_empty,
        cover_open,
        paper_empty,
        paper_near_empty: flag(raw.paper_near_empty),
        drawer_open: flag(raw.drawer_open),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(cover_open: Option<bool>, paper_empty: Option<bool>) -> RawStatus {
        RawStatus {
            cover_open,
            paper_empty,
            ..Default::default()
        }
    }

    #[test]
    fn test_online_truth_table() {
        let cases = [
            (false, false, true),
            (true, false, false),
            (false, true, false),
            (true, true, false),
        ];
        for (cover, paper, online) in cases {
            let status = map_status(&raw(Some(cover), Some(paper)));
            assert_eq!(status.online, online, "cover={} paper={}", cover, paper);
            assert_eq!(status.cover_open, cover);
            assert_eq!(status.paper_empty, paper);
        }
    }

    #[test]
    fn test_unknown_fields_are_false() {
        let status = map_status(&RawStatus::default());
        assert!(status.online);
        assert!(!status.cover_open);
        assert!(!status.paper_near_empty);
        assert!(!status.drawer_open);
    }

    #[test]
    fn test_serialized_keys() {
        let status = map_status(&RawStatus {
            cover_open: Some(false),
            paper_empty: Some(false),
            paper_near_empty: Some(true),
            drawer_open: Some(true),
        });
        let json = serde_json::to_value(status).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "online": true,
                "coverOpen": false,
                "paperEmpty": false,
                "paperNearEmpty": true,
                "drawerOpen": true
            })
        );
    }
}
