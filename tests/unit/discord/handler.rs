use serenity::all::UserId;

use super::*;

fn discord_user(id: u64, name: &str) -> User {
    let mut u = User::default();
    u.id = UserId::new(id);
    u.name = name.to_string();
    u
}

#[test]
fn mentions_follow_text_order_without_duplicates() {
    let a = discord_user(11, "alice");
    let b = discord_user(22, "bob");
    let c = discord_user(33, "carol");
    let content = "!ship <@!22> and <@11> <@22>";
    let mentions = vec![a.clone(), c.clone(), b.clone(), a.clone()];

    let ordered: Vec<u64> = ordered_mentions(content, &mentions)
        .into_iter()
        .map(|u| u.id.get())
        .collect();
    // carol is mentioned (e.g. via a reply) but not in the text
    assert_eq!(ordered, vec![22, 11, 33]);
}

#[test]
fn user_ref_prefers_member_then_global_name() {
    let mut u = discord_user(5, "handle");
    assert_eq!(user_ref(&u, None).display_name, "handle");
    u.global_name = Some("Global".into());
    assert_eq!(user_ref(&u, None).display_name, "Global");
    let r = user_ref(&u, Some("Nick"));
    assert_eq!(r.display_name, "Nick");
    assert_eq!(r.id, "5");
    assert!(r.avatar_url(128).unwrap().ends_with("?size=128"));
}

#[test]
fn intents_include_member_cache() {
    let i = intents();
    assert!(i.contains(GatewayIntents::GUILD_MEMBERS));
    assert!(i.contains(GatewayIntents::MESSAGE_CONTENT));
}
