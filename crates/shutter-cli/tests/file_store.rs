//! CLI integration tests against a file store.

mod common;

use common::Sandbox;

fn create_profile(sandbox: &Sandbox, username: &str, name: &str) -> String {
    let profile = sandbox.run_json(&["profile", "create", username, "--name", name]);
    profile[0]["id"].as_str().unwrap().to_string()
}

fn post(sandbox: &Sandbox, author: &str, caption: &str) -> String {
    let post = sandbox.run_json(&["--as", author, "post", caption]);
    post[0]["id"].as_str().unwrap().to_string()
}

fn captions(rows: &[serde_json::Value]) -> Vec<&str> {
    rows.iter().map(|r| r["caption"].as_str().unwrap()).collect()
}

#[test]
fn test_profile_create_and_show() {
    let sandbox = Sandbox::new();
    create_profile(&sandbox, "amy", "Amy Pond");

    let stdout = sandbox.run_success(&["profile", "show", "amy"]);
    assert!(stdout.contains("amy"));
    assert!(stdout.contains("Amy Pond"));
}

#[test]
fn test_duplicate_username_fails() {
    let sandbox = Sandbox::new();
    create_profile(&sandbox, "amy", "Amy Pond");

    let output = sandbox.run(&["profile", "create", "amy", "--name", "Someone Else"]);
    assert!(!output.status.success());
}

#[test]
fn test_feed_pages_newest_first() {
    let sandbox = Sandbox::new();
    create_profile(&sandbox, "amy", "Amy Pond");
    create_profile(&sandbox, "rory", "Rory Williams");

    for caption in ["one", "two", "three"] {
        post(&sandbox, "rory", caption);
    }
    post(&sandbox, "amy", "mine");
    sandbox.run_success(&["--as", "amy", "follow", "rory"]);

    let all = sandbox.run_json(&["--as", "amy", "--page-size", "2", "feed"]);
    assert_eq!(captions(&all), vec!["mine", "three", "two", "one"]);

    let first = sandbox.run_json(&["--as", "amy", "--page-size", "2", "feed", "--pages", "1"]);
    assert_eq!(captions(&first), vec!["mine", "three"]);
}

#[test]
fn test_feed_without_follows_shows_own_posts() {
    let sandbox = Sandbox::new();
    create_profile(&sandbox, "amy", "Amy Pond");
    create_profile(&sandbox, "rory", "Rory Williams");
    post(&sandbox, "rory", "not followed");
    post(&sandbox, "amy", "mine");

    let rows = sandbox.run_json(&["--as", "amy", "feed"]);
    assert_eq!(captions(&rows), vec!["mine"]);
}

#[test]
fn test_profile_posts_and_delete() {
    let sandbox = Sandbox::new();
    create_profile(&sandbox, "amy", "Amy Pond");
    create_profile(&sandbox, "rory", "Rory Williams");
    let first = post(&sandbox, "amy", "first");
    post(&sandbox, "amy", "second");

    // Someone else's post cannot be deleted.
    let output = sandbox.run(&["--as", "rory", "delete-post", &first]);
    assert!(!output.status.success());

    sandbox.run_success(&["--as", "amy", "delete-post", &first]);
    let rows = sandbox.run_json(&["posts", "amy"]);
    assert_eq!(captions(&rows), vec!["second"]);
}

#[test]
fn test_comments_newest_first() {
    let sandbox = Sandbox::new();
    create_profile(&sandbox, "amy", "Amy Pond");
    let post_id = post(&sandbox, "amy", "sunset");

    sandbox.run_success(&["--as", "amy", "comment", &post_id, "nice"]);
    sandbox.run_success(&["--as", "amy", "comment", &post_id, "very nice"]);

    let rows = sandbox.run_json(&["comments", &post_id]);
    let texts: Vec<&str> = rows.iter().map(|r| r["text"].as_str().unwrap()).collect();
    assert_eq!(texts, vec!["very nice", "nice"]);
}

#[test]
fn test_search_by_prefix() {
    let sandbox = Sandbox::new();
    for name in ["janet", "jane", "john", "amy"] {
        create_profile(&sandbox, name, name);
    }

    let rows = sandbox.run_json(&["search", "JAN"]);
    let names: Vec<&str> = rows.iter().map(|r| r["username"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["jane", "janet"]);

    let output = sandbox.run(&["search", "zed"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).trim().is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No results"));
}

#[test]
fn test_followers_and_following() {
    let sandbox = Sandbox::new();
    let amy = create_profile(&sandbox, "amy", "Amy Pond");
    let rory = create_profile(&sandbox, "rory", "Rory Williams");
    create_profile(&sandbox, "clara", "Clara Oswald");

    sandbox.run_success(&["--as", "amy", "follow", "rory"]);
    sandbox.run_success(&["--as", "clara", "follow", "rory"]);
    // Following twice keeps one relationship.
    sandbox.run_success(&["--as", "amy", "follow", "rory"]);

    let followers = sandbox.run_json(&["followers", "rory"]);
    assert_eq!(followers.len(), 2);

    let following = sandbox.run_json(&["following", "amy"]);
    assert_eq!(following.len(), 1);
    assert_eq!(following[0]["follower"], amy.as_str());
    assert_eq!(following[0]["followee"], rory.as_str());

    sandbox.run_success(&["--as", "amy", "unfollow", "rory"]);
    assert!(sandbox.run_json(&["following", "amy"]).is_empty());
}

#[test]
fn test_use_remembers_user() {
    let sandbox = Sandbox::new();
    create_profile(&sandbox, "amy", "Amy Pond");

    // Without an acting user, writes are refused.
    let output = sandbox.run(&["post", "hello"]);
    assert!(!output.status.success());

    sandbox.run_success(&["use", "amy", "--page-size", "5"]);
    let config = std::fs::read_to_string(
        sandbox.home().join("data").join("shutter").join("config.json"),
    )
    .unwrap();
    assert!(config.contains(sandbox.store_url()));
    assert!(config.contains("\"page_size\": 5"));

    sandbox.run_success(&["post", "hello"]);
    let rows = sandbox.run_json(&["posts"]);
    assert_eq!(captions(&rows), vec!["hello"]);
}

#[test]
fn test_use_unknown_user_fails() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["use", "nobody"]);
    assert!(!output.status.success());
}
