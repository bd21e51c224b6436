//! Legacy Anki collection schema (`collection.anki2`, schema version 11).

use serde_json::{Value, json};

pub const COLLECTION_VERSION: i64 = 11;

/// Id of the built-in "Default" deck every collection carries.
pub const DEFAULT_DECK_ID: i64 = 1;

pub const CREATE_SCHEMA: &str = r#"
CREATE TABLE col (
    id      integer primary key,
    crt     integer not null,
    mod     integer not null,
    scm     integer not null,
    ver     integer not null,
    dty     integer not null,
    usn     integer not null,
    ls      integer not null,
    conf    text not null,
    models  text not null,
    decks   text not null,
    dconf   text not null,
    tags    text not null
);
CREATE TABLE notes (
    id      integer primary key,
    guid    text not null,
    mid     integer not null,
    mod     integer not null,
    usn     integer not null,
    tags    text not null,
    flds    text not null,
    sfld    integer not null,
    csum    integer not null,
    flags   integer not null,
    data    text not null
);
CREATE TABLE cards (
    id      integer primary key,
    nid     integer not null,
    did     integer not null,
    ord     integer not null,
    mod     integer not null,
    usn     integer not null,
    type    integer not null,
    queue   integer not null,
    due     integer not null,
    ivl     integer not null,
    factor  integer not null,
    reps    integer not null,
    lapses  integer not null,
    left    integer not null,
    odue    integer not null,
    odid    integer not null,
    flags   integer not null,
    data    text not null
);
CREATE TABLE revlog (
    id      integer primary key,
    cid     integer not null,
    usn     integer not null,
    ease    integer not null,
    ivl     integer not null,
    lastIvl integer not null,
    factor  integer not null,
    time    integer not null,
    type    integer not null
);
CREATE TABLE graves (
    usn     integer not null,
    oid     integer not null,
    type    integer not null
);
CREATE INDEX ix_notes_usn ON notes (usn);
CREATE INDEX ix_cards_usn ON cards (usn);
CREATE INDEX ix_revlog_usn ON revlog (usn);
CREATE INDEX ix_cards_nid ON cards (nid);
CREATE INDEX ix_cards_sched ON cards (did, queue, due);
CREATE INDEX ix_revlog_cid ON revlog (cid);
CREATE INDEX ix_notes_csum ON notes (csum);
"#;

pub const INSERT_COLLECTION: &str = "INSERT INTO col \
    (id, crt, mod, scm, ver, dty, usn, ls, conf, models, decks, dconf, tags) \
    VALUES (1, ?1, ?2, ?2, ?3, 0, 0, 0, ?4, ?5, ?6, ?7, '{}')";

pub const INSERT_NOTE: &str = "INSERT INTO notes \
    (id, guid, mid, mod, usn, tags, flds, sfld, csum, flags, data) \
    VALUES (?1, ?2, ?3, ?4, -1, '', ?5, ?6, ?7, 0, '')";

pub const INSERT_CARD: &str = "INSERT INTO cards \
    (id, nid, did, ord, mod, usn, type, queue, due, ivl, factor, reps, lapses, left, odue, odid, flags, data) \
    VALUES (?1, ?2, ?3, 0, ?4, -1, 0, 0, ?5, 0, 0, 0, 0, 0, 0, 0, 0, '')";

const CARD_CSS: &str = ".card {\n font-family: arial;\n font-size: 20px;\n text-align: center;\n color: black;\n background-color: white;\n}\n";

/// Identifiers and timestamps shared by every row of one collection.
#[derive(Debug, Clone, Copy)]
pub struct CollectionIds {
    pub model_id: i64,
    pub deck_id: i64,
    /// Seconds since the epoch
    pub now_secs: i64,
}

pub fn conf_json(ids: &CollectionIds) -> Value {
    json!({
        "nextPos": 1,
        "estTimes": true,
        "activeDecks": [ids.deck_id],
        "sortType": "noteFld",
        "timeLim": 0,
        "sortBackwards": false,
        "addToCur": true,
        "curDeck": ids.deck_id,
        "newBury": true,
        "newSpread": 0,
        "dueCounts": true,
        "curModel": ids.model_id.to_string(),
        "collapseTime": 1200
    })
}

/// Two-field Basic note type with a single front/back template.
pub fn models_json(ids: &CollectionIds) -> Value {
    let field = |name: &str, ord: u32| {
        json!({
            "name": name,
            "ord": ord,
            "sticky": false,
            "rtl": false,
            "font": "Arial",
            "size": 20,
            "media": []
        })
    };

    let model = json!({
        "id": ids.model_id,
        "name": "Basic (quickcards)",
        "type": 0,
        "mod": ids.now_secs,
        "usn": -1,
        "sortf": 0,
        "did": ids.deck_id,
        "tmpls": [{
            "name": "Card 1",
            "ord": 0,
            "qfmt": "{{Front}}",
            "afmt": "{{FrontSide}}\n\n<hr id=answer>\n\n{{Back}}",
            "did": null,
            "bqfmt": "",
            "bafmt": ""
        }],
        "flds": [field("Front", 0), field("Back", 1)],
        "css": CARD_CSS,
        "latexPre": "\\documentclass[12pt]{article}\n\\special{papersize=3in,5in}\n\\usepackage[utf8]{inputenc}\n\\usepackage{amssymb,amsmath}\n\\pagestyle{empty}\n\\setlength{\\parindent}{0in}\n\\begin{document}\n",
        "latexPost": "\\end{document}",
        "tags": [],
        "vers": [],
        "req": [[0, "all", [0]]]
    });

    json!({ ids.model_id.to_string(): model })
}

fn deck_entry(id: i64, name: &str, now_secs: i64) -> Value {
    json!({
        "id": id,
        "name": name,
        "desc": "",
        "mod": now_secs,
        "usn": -1,
        "collapsed": false,
        "newToday": [0, 0],
        "revToday": [0, 0],
        "lrnToday": [0, 0],
        "timeToday": [0, 0],
        "dyn": 0,
        "conf": 1,
        "extendNew": 10,
        "extendRev": 50
    })
}

pub fn decks_json(ids: &CollectionIds, deck_title: &str) -> Value {
    json!({
        DEFAULT_DECK_ID.to_string(): deck_entry(DEFAULT_DECK_ID, "Default", ids.now_secs),
        ids.deck_id.to_string(): deck_entry(ids.deck_id, deck_title, ids.now_secs),
    })
}

pub fn dconf_json() -> Value {
    json!({
        "1": {
            "id": 1,
            "name": "Default",
            "mod": 0,
            "usn": 0,
            "maxTaken": 60,
            "autoplay": true,
            "timer": 0,
            "replayq": true,
            "dyn": false,
            "new": {
                "bury": true,
                "delays": [1, 10],
                "initialFactor": 2500,
                "ints": [1, 4, 7],
                "order": 1,
                "perDay": 20,
                "separate": true
            },
            "rev": {
                "bury": true,
                "ease4": 1.3,
                "fuzz": 0.05,
                "ivlFct": 1,
                "maxIvl": 36500,
                "minSpace": 1,
                "perDay": 100
            },
            "lapse": {
                "delays": [10],
                "leechAction": 0,
                "leechFails": 8,
                "minInt": 1,
                "mult": 0
            }
        }
    })
}
