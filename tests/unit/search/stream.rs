use super::*;

const BODY: &str = concat!(
    r#"{"type":"init","message":"searching"}"#,
    "\n",
    r#"{"type":"init","total":2}"#,
    "\n",
    r#"{"type":"gameStart","game":{"id":10,"name":"Celeste","image":null}}"#,
    "\n",
    r#"{"type":"gameStart","game":{"id":"b7","name":"Hades","image":null}}"#,
    "\n",
    r#"{"type":"gameComplete","game":{"id":10,"name":"Celeste","image":"https://x/c.png"}}"#,
    "\n",
    r#"{"type":"gameError","gameId":"b7","error":"cover lookup failed"}"#,
    "\n",
    r#"{"type":"end","message":"done","successCount":1}"#,
    "\n",
);

#[test]
fn feed_keeps_first_seen_order_and_replaces_in_place() {
    let feed = collect_feed(BODY.as_bytes());
    let names: Vec<&str> = feed.results().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Celeste", "Hades"]);
    assert_eq!(feed.results()[0].image.as_deref(), Some("https://x/c.png"));
    assert_eq!(feed.results()[1].id, Some(ResultId::Text("b7".into())));
    assert_eq!(feed.failures().len(), 1);
    assert_eq!(feed.status(), &SearchStatus::Success);
}

#[test]
fn chunks_split_mid_line_and_mid_utf8() {
    let line = "{\"type\":\"gameStart\",\"game\":{\"id\":1,\"name\":\"塞尔达\"}}\n";
    let bytes = line.as_bytes();
    let split = line.find('尔').unwrap() + 1;
    let mut decoder = LineDecoder::new();
    assert!(decoder.push(&bytes[..split]).is_empty());
    let events = decoder.push(&bytes[split..]);
    assert_eq!(events.len(), 1);
    match &events[0] {
        SearchEvent::ItemStarted { game } => assert_eq!(game.name, "塞尔达"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn movie_event_names_are_accepted() {
    let feed = collect_feed(
        br#"{"type":"movieComplete","movie":{"id":5,"name":"Heat","image":"/p.jpg"}}"#,
    );
    assert_eq!(feed.results().len(), 1);
    assert_eq!(feed.results()[0].id, Some(ResultId::Number(5)));
    // No `end`: closing with results settles on success.
    assert_eq!(feed.status(), &SearchStatus::Success);
}

#[test]
fn garbage_lines_are_skipped() {
    let feed = collect_feed(b"not json\n\n{\"type\":\"end\",\"message\":\"none\"}\n");
    assert_eq!(
        feed.status(),
        &SearchStatus::NoResults {
            message: Some("none".into())
        }
    );
}

#[test]
fn error_event_survives_close() {
    let feed = collect_feed(b"{\"type\":\"error\",\"message\":\"no key\"}\n");
    assert_eq!(
        feed.status(),
        &SearchStatus::Failed {
            message: Some("no key".into())
        }
    );
}

#[test]
fn results_without_id_are_ignored() {
    let mut feed = SearchFeed::new();
    feed.apply(SearchEvent::ItemStarted {
        game: SearchResult {
            id: None,
            name: "anon".into(),
            image: None,
        },
    });
    assert!(feed.results().is_empty());
    feed.close();
    assert_eq!(feed.status(), &SearchStatus::NoResults { message: None });
}
