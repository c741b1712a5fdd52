//! Outreach control: dedup, spacing, debounce and retries for outbound
//! candidate contact.

pub mod debounce;
pub mod guard;
pub mod handlers;
pub mod retry;

pub use debounce::Debouncer;
pub use guard::{OutreachGuard, OutreachOutcome};
pub use retry::RetryPolicy;

use crate::models::job::JobRequirement;

/// Greeting message for a first contact, built from the active requirement.
pub fn greeting_text(job: &JobRequirement) -> String {
    match job.description.as_deref() {
        Some(description) => format!(
            "您好！我们正在招聘{}（{}），看了您的资料觉得很匹配，方便聊一聊吗？",
            job.name, description
        ),
        None => format!(
            "您好！我们正在招聘{}，看了您的资料觉得很匹配，方便聊一聊吗？",
            job.name
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_includes_job_name() {
        let job = JobRequirement::new("短视频拍摄剪辑运营");
        let text = greeting_text(&job);
        assert!(text.contains("短视频拍摄剪辑运营"));
    }

    #[test]
    fn test_greeting_includes_description_when_present() {
        let mut job = JobRequirement::new("短视频运营");
        job.description = Some("负责账号内容策划与剪辑".to_string());
        let text = greeting_text(&job);
        assert!(text.contains("负责账号内容策划与剪辑"));
    }
}
