//! Parses `<basename>.hud-app-info` seed files: an XML tree describing how
//! often a menu item was used by a previous session, so a freshly-installed
//! application doesn't start with every result tied at zero usage.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::AppInfoError;

/// One `item` element: its fully-qualified `menu > menu > item` path and the
/// activation count recorded against it, already clamped to the 30-day
/// window the usage store covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedEntry {
    pub item_identifier: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAppInfo {
    pub desktopfile: String,
    pub entries: Vec<SeedEntry>,
}

const MAX_COUNT: u32 = 30;

struct ParseState {
    seen_header: bool,
    desktopfile: Option<String>,
    menu_stack: Vec<String>,
    entries: Vec<SeedEntry>,
}

pub fn parse(xml: &str) -> Result<ParsedAppInfo, AppInfoError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut state = ParseState {
        seen_header: false,
        desktopfile: None,
        menu_stack: Vec::new(),
        entries: Vec::new(),
    };

    let mut buf = Vec::new();
    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| AppInfoError::Xml(e.to_string()))?
        {
            Event::Eof => break,
            Event::Start(tag) => {
                let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
                handle_start(&mut state, &name, &tag)?;
            }
            Event::Empty(tag) => {
                let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
                handle_start(&mut state, &name, &tag)?;
                if name == "menu" {
                    state.menu_stack.pop();
                }
            }
            Event::End(tag) => {
                let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
                if name == "menu" {
                    state.menu_stack.pop();
                }
            }
            _ => {}
        }
        buf.clear();
    }

    let desktopfile = state.desktopfile.ok_or(AppInfoError::MissingDesktop)?;
    Ok(ParsedAppInfo {
        desktopfile,
        entries: state.entries,
    })
}

fn handle_start(
    state: &mut ParseState,
    name: &str,
    tag: &quick_xml::events::BytesStart,
) -> Result<(), AppInfoError> {
    if name == "hudappinfo" {
        if state.seen_header {
            return Err(AppInfoError::DuplicateHeaders);
        }
        state.seen_header = true;
        return Ok(());
    }

    if !state.seen_header {
        return Err(AppInfoError::MissingHeader(name.to_string()));
    }

    match name {
        "desktopfile" => {
            let path = attr(tag, "path").ok_or_else(|| {
                AppInfoError::Xml("<desktopfile> is missing its 'path' attribute".to_string())
            })?;
            if let Some(existing) = &state.desktopfile {
                return Err(AppInfoError::DuplicateDesktopfile {
                    first: existing.clone(),
                    second: path,
                });
            }
            state.desktopfile = Some(path);
        }
        "menus" => {
            if state.desktopfile.is_none() {
                return Err(AppInfoError::MissingDesktop);
            }
        }
        "menu" => {
            let mname = attr(tag, "name").ok_or_else(|| {
                AppInfoError::Xml("<menu> is missing its 'name' attribute".to_string())
            })?;
            let full = match state.menu_stack.last() {
                Some(parent) => format!("{parent} > {mname}"),
                None => mname,
            };
            state.menu_stack.push(full);
        }
        "item" => {
            let iname = attr(tag, "name").ok_or_else(|| {
                AppInfoError::Xml("<item> is missing its 'name' attribute".to_string())
            })?;
            let count: u32 = attr(tag, "count")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0);
            let full = match state.menu_stack.last() {
                Some(parent) => format!("{parent} > {iname}"),
                None => iname,
            };
            state.entries.push(SeedEntry {
                item_identifier: full,
                count: count.min(MAX_COUNT),
            });
        }
        _ => {}
    }

    Ok(())
}

fn attr(tag: &quick_xml::events::BytesStart, key: &str) -> Option<String> {
    tag.attributes().flatten().find_map(|a| {
        if a.key.as_ref() == key.as_bytes() {
            Some(String::from_utf8_lossy(&a.value).into_owned())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = r#"
        <hudappinfo>
            <desktopfile path="/usr/share/applications/foo.desktop" />
            <menus>
                <menu name="File">
                    <item name="Print…" count="5" />
                </menu>
                <menu name="Edit">
                    <item name="Preferences" count="50" />
                </menu>
            </menus>
        </hudappinfo>
    "#;

    #[test]
    fn parses_nested_menu_paths_and_clamps_count() {
        let parsed = parse(WELL_FORMED).unwrap();
        assert_eq!(parsed.desktopfile, "/usr/share/applications/foo.desktop");
        assert_eq!(
            parsed.entries,
            vec![
                SeedEntry {
                    item_identifier: "File > Print…".to_string(),
                    count: 5
                },
                SeedEntry {
                    item_identifier: "Edit > Preferences".to_string(),
                    count: 30
                },
            ]
        );
    }

    #[test]
    fn a_second_header_is_rejected() {
        let xml = "<hudappinfo></hudappinfo><hudappinfo></hudappinfo>";
        assert_eq!(parse(xml), Err(AppInfoError::DuplicateHeaders));
    }

    #[test]
    fn an_element_before_the_header_is_rejected() {
        let xml = "<menus></menus><hudappinfo></hudappinfo>";
        match parse(xml) {
            Err(AppInfoError::MissingHeader(name)) => assert_eq!(name, "menus"),
            other => panic!("expected MissingHeader, got {other:?}"),
        }
    }

    #[test]
    fn menus_before_desktopfile_is_rejected() {
        let xml = r#"<hudappinfo><menus></menus></hudappinfo>"#;
        assert_eq!(parse(xml), Err(AppInfoError::MissingDesktop));
    }

    #[test]
    fn a_second_desktopfile_is_rejected() {
        let xml = r#"<hudappinfo>
            <desktopfile path="/a.desktop" />
            <desktopfile path="/b.desktop" />
        </hudappinfo>"#;
        match parse(xml) {
            Err(AppInfoError::DuplicateDesktopfile { first, second }) => {
                assert_eq!(first, "/a.desktop");
                assert_eq!(second, "/b.desktop");
            }
            other => panic!("expected DuplicateDesktopfile, got {other:?}"),
        }
    }
}
