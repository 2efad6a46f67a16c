//! Static knowledge base for turns that carry no actionable intent.
//!
//! Deliberately small: keyword buckets over the lowercased utterance,
//! first hit wins, with a generic capability answer as the fallback.

const FALLBACK: &str = "I can help you add or manage events, posts and resources, update your \
     profile, or pass feedback along to the admins. What would you like to do?";

pub fn answer(text: &str) -> String {
    let lower = text.to_lowercase();
    let hit = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if hit(&["event", "meetup", "calendar", "happening", "when"]) {
        "Upcoming events live on the community calendar. If you'd like to add one, just tell me \
         something like \"add an event called Hack Night next Tuesday\"."
    } else if hit(&["post", "news", "article", "announcement", "video"]) {
        "Community posts cover announcements, news and videos. Say \"write a post\" and I'll walk \
         you through publishing one."
    } else if hit(&["resource", "tool", "wiki"]) {
        "The resource library collects tools and guides members have shared. Say \"add a \
         resource\" to contribute one."
    } else if hit(&["profile", "username", "avatar", "account"]) {
        "You can update your profile right here — say \"update my profile\" and I'll take you \
         through it field by field."
    } else if hit(&["feedback", "suggestion", "complain", "bug"]) {
        "I'd love to hear it. Say \"I have some feedback\" and I'll pass it along to the admins."
    } else if hit(&["sign in", "log in", "login", "signin"]) {
        "Use the sign-in button at the top of the page. Once you're in, I can save things on \
         your behalf."
    } else {
        FALLBACK
    }
    .to_string()
}
