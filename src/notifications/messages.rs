//! Notification wording. Texts are user-facing and stay in Vietnamese.

use chrono::NaiveTime;
use rand::{Rng, RngCore};

use crate::models::{EventKind, ScheduleEvent};

pub const DIGEST_TITLE: &str = "Thông báo lịch học ngày mai";
pub const SCHEDULE_DONE_TITLE: &str = "Thông báo hệ thống";
pub const SCHEDULE_DONE_BODY: &str =
    "Đã lên lịch thông báo thành công từ dữ liệu lịch học, lịch thi và ghi chú của bạn!";
pub const NOTE_TITLE_PREFIX: &str = "Nhắc nhở ghi chú: ";

pub const SYNC_DONE_TITLE: &str = "Thông báo đồng bộ dữ liệu";
pub const SYNC_DONE_BODY: &str =
    "Dữ liệu ghi chú đã được đồng bộ thành công và lịch thông báo đã được cập nhật!";
pub const KEY_MISMATCH_TITLE: &str = "Cảnh báo đồng bộ";
pub const KEY_MISMATCH_BODY: &str =
    "Phát hiện mã P2P không khớp. Đồng bộ dữ liệu bị hủy để bảo vệ thông tin của bạn.";
pub const KEY_UPDATE_TITLE: &str = "Nhắc nhở cập nhật mã P2P";
pub const KEY_UPDATE_BODY: &str = "Bạn cần cập nhật mã P2P để tiếp tục sử dụng tính năng đồng bộ dữ liệu bằng cách truy cập vào mục cài đặt -> Cập nhật mã P2P.";

pub const REFRESH_DONE_TITLE: &str = "Đã tự động cập nhật dữ liệu mới";
pub const REFRESH_DONE_BODY: &str =
    "Hệ thống đã tự động cập nhật dữ liệu lịch học, lịch thi, điểm số mới nhất từ hệ thống ICTU";
pub const CREDENTIALS_TITLE: &str = "Cập nhật thông tin đăng nhập";
pub const CREDENTIALS_BODY: &str = "Vui lòng cập nhật thông tin đăng nhập để tiếp tục đồng bộ dữ liệu";

/// Messages for days without any class or exam.
pub const FILLER_MESSAGES: [&str; 25] = [
    "Ting ting! Ngày mai không có lớp nè! Hãy `setMood('siêu vui') && danceAroundTheRoom();`",
    "Ối giời ơi, ngày mai nghỉ học kìa! Đến lúc `launchConfetti() && shoutHooray();`",
    "Tin hot: Ngày mai không có lớp! Mau `prepareSnacks() && bingeWatchFavoriteSeries();`",
    "Ê psst, ngày mai nghỉ học đấy! Hãy `rollOutOfBed.late() && enjoyPajamaDay();`",
    "Tin vui: Ngày mai không có lớp! Đến lúc `activateSlothMode() && embraceLaziness();`",
    "Ting tong! Không có lớp ngày mai nha! Mau `planAdventure() || buildBlanketFort();`",
    "Tada! Ngày mai được nghỉ học! Hãy `unleashCreativity() && makeAGlorifulMess();`",
    "Ối chu choa, ngày mai không có lớp kìa! Đến lúc `orderPizza() && inviteFriendsOver();`",
    "Tin ngọt ngào: Ngày mai nghỉ học! Mau `grabFavoriteBook() && readUntilSunrise();`",
    "Ê bạn ơi, ngày mai không có lớp đâu! Hãy `packBackpack() && goOnMiniAdventure();`",
    "Tin khủng: Ngày mai được nghỉ! Đến lúc `adoptTemporaryCat() && becomeABuddyForADay();`",
    "Ting ting ting! Không có lớp ngày mai nha! Mau `createMovieMarathon() && inviteTheBestie();`",
    "Ố la la, ngày mai nghỉ học! Hãy `turnLivingRoomIntoArtStudio() && paintLikeAnArtist();`",
    "Tin vui nè: Ngày mai không có lớp! Đến lúc `visitLocalCafe() && tryEveryPastry();`",
    "Ê này, ngày mai được nghỉ đấy! Mau `inventNewRecipe() && hostMasterchefCompetition();`",
    "Tin hot hòn họt: Ngày mai không có lớp! Hãy `transformIntoSuperHero() && saveTheDay();`",
    "Ối giời, ngày mai nghỉ học kìa! Đến lúc `buildTimeMachine() && visitDinosaurs();`",
    "Tin vui nè bạn ơi: Ngày mai không có lớp! Mau `organizeFlashMob() && danceInPublic();`",
    "Ting tong! Ngày mai được nghỉ nha! Hãy `learnMagicTricks() && amazeFriends();`",
    "Ê psst, ngày mai không có lớp đâu! Đến lúc `buildRobotFriend() && teachItToLaugh();`",
    "Tin khủng: Ngày mai nghỉ học! Mau `hostPajamaParty() && stayUpAllNight();`",
    "Ố la la, ngày mai không có lớp kìa! Hãy `learnNewLanguage() && orderFoodInIt();`",
    "Tin ngọt ngào: Ngày mai được nghỉ! Đến lúc `becomeYouTuber() && goViral();`",
    "Ting ting ting! Không có lớp ngày mai nha! Mau `writeFunnyStory() && performItForFamily();`",
    "Ối chu choa, ngày mai nghỉ học! Hãy `createMusicVideo() && becomeTikTokStar();`",
];

/// Escapes `<`, `>`, `"` and `'` as HTML entities.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Uniformly picks a filler message, already escaped.
pub fn pick_filler(rng: &mut dyn RngCore) -> String {
    let index = rng.gen_range(0..FILLER_MESSAGES.len());
    escape_html(FILLER_MESSAGES[index])
}

/// Every filler message in its escaped form.
pub fn escaped_filler_pool() -> Vec<String> {
    FILLER_MESSAGES.iter().map(|m| escape_html(m)).collect()
}

/// Title and body for a lead-time reminder.
pub fn lead_time_message(event: &ScheduleEvent, lead_minutes: u32) -> (String, String) {
    let seat = event.seat_number.as_deref().unwrap_or_default();
    if lead_minutes == 0 {
        let title = format!("{} đang bắt đầu!", event.name);
        let body = match event.kind {
            EventKind::Class => format!(
                "Lớp học {} đang bắt đầu ngay bây giờ, hãy đến lớp {} ngay thôi!",
                event.name, event.room
            ),
            EventKind::Exam => format!(
                "Môn thi {} đang bắt đầu ngay bây giờ, mời bạn SBD {} đến phòng thi {} ngay thôi!",
                event.name, seat, event.room
            ),
        };
        (title, body)
    } else {
        match event.kind {
            EventKind::Class => (
                format!("Sắp đến giờ học {}", event.name),
                format!(
                    "Lớp học {} sẽ bắt đầu trong {} phút nữa, hãy đến lớp {} ngay thôi!",
                    event.name, lead_minutes, event.room
                ),
            ),
            EventKind::Exam => (
                format!("Sắp đến giờ thi {}", event.name),
                format!(
                    "Môn thi {} sẽ bắt đầu trong {} phút nữa, mời bạn SBD {} đến phòng thi {} ngay thôi!",
                    event.name, lead_minutes, seat, event.room
                ),
            ),
        }
    }
}

pub fn digest_count_message(count: usize) -> String {
    format!(
        "Ngày mai bạn có {} lịch học cần thực hiện, hãy kiểm tra ngay lịch học của mình!",
        count
    )
}

pub fn digest_exam_line(name: &str, start: NaiveTime, room: &str, seat: &str) -> String {
    format!(
        "Lịch thi môn {} vào lúc {} tại phòng {}, số báo danh {}.",
        name,
        start.format("%H:%M"),
        room,
        seat
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<b>"hi"</b> it's"#), "&lt;b&gt;&quot;hi&quot;&lt;/b&gt; it&#39;s");
        assert_eq!(escape_html("a && b"), "a && b");
    }

    #[test]
    fn test_pick_filler_is_from_pool() {
        let pool = escaped_filler_pool();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let message = pick_filler(&mut rng);
            assert!(!message.is_empty());
            assert!(pool.contains(&message));
        }
    }

    #[test]
    fn test_pick_filler_is_deterministic_for_a_seed() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        assert_eq!(pick_filler(&mut a), pick_filler(&mut b));
    }

    #[test]
    fn test_first_filler_is_escaped() {
        assert!(escaped_filler_pool()[0].contains("setMood(&#39;siêu vui&#39;)"));
    }

    #[test]
    fn test_lead_time_messages() {
        let class = ScheduleEvent::class("CS101", "A101", Utc::now());
        let (title, body) = lead_time_message(&class, 15);
        assert_eq!(title, "Sắp đến giờ học CS101");
        assert!(body.contains("15 phút nữa"));
        assert!(body.contains("A101"));

        let (title, _) = lead_time_message(&class, 0);
        assert_eq!(title, "CS101 đang bắt đầu!");

        let exam = ScheduleEvent::exam("Math", "P301", Utc::now(), "17");
        let (title, body) = lead_time_message(&exam, 30);
        assert_eq!(title, "Sắp đến giờ thi Math");
        assert!(body.contains("SBD 17"));
    }
}
