//! Catalogue payload decoding into tracks, radios and playlists

use serde_json::Value;

use crate::error::RemoteError;
use super::types::{PlaylistRef, Radio, Track};

fn array_at<'a>(payload: &'a Value, pointer: &str) -> Result<&'a Vec<Value>, RemoteError> {
    payload
        .pointer(pointer)
        .and_then(Value::as_array)
        .ok_or_else(|| RemoteError::Malformed(format!("expected array at {}", pointer)))
}

fn str_field(value: &Value, key: &str) -> String {
    value.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

/// Decode one song object. Both the short (`ar`/`al`/`dt`) and the long
/// (`artists`/`album`/`duration`) field spellings are accepted.
fn song(value: &Value, stream_template: &str) -> Option<Track> {
    let id = value.get("id").and_then(Value::as_u64)?;
    let artists = value
        .get("ar")
        .or_else(|| value.get("artists"))
        .and_then(Value::as_array)
        .map(|list| list.iter().map(|a| str_field(a, "name")).collect())
        .unwrap_or_default();
    let album = value
        .get("al")
        .or_else(|| value.get("album"))
        .map(|a| str_field(a, "name"))
        .unwrap_or_default();
    let duration_ms = value
        .get("dt")
        .or_else(|| value.get("duration"))
        .and_then(Value::as_u64)
        .unwrap_or(0) as u32;

    Some(Track {
        id,
        title: str_field(value, "name"),
        artists,
        album,
        duration_ms,
        locator: stream_template.replace("{id}", &id.to_string()),
    })
}

fn songs(list: &[Value], stream_template: &str) -> Vec<Track> {
    list.iter().filter_map(|v| song(v, stream_template)).collect()
}

pub fn fm_songs(payload: &Value, stream_template: &str) -> Result<Vec<Track>, RemoteError> {
    Ok(songs(array_at(payload, "/data")?, stream_template))
}

pub fn daily_songs(payload: &Value, stream_template: &str) -> Result<Vec<Track>, RemoteError> {
    Ok(songs(array_at(payload, "/data/dailySongs")?, stream_template))
}

pub fn playlist_tracks(payload: &Value, stream_template: &str) -> Result<Vec<Track>, RemoteError> {
    Ok(songs(array_at(payload, "/playlist/tracks")?, stream_template))
}

/// Programs are played through their main song, titled after the program.
pub fn dj_programs(payload: &Value, stream_template: &str) -> Result<Vec<Track>, RemoteError> {
    let programs = array_at(payload, "/programs")?;
    Ok(programs
        .iter()
        .filter_map(|program| {
            let mut track = song(program.get("mainSong")?, stream_template)?;
            let name = str_field(program, "name");
            if !name.is_empty() {
                track.title = name;
            }
            if let Some(dj) = program.pointer("/dj/nickname").and_then(Value::as_str) {
                track.artists = vec![dj.to_string()];
            }
            Some(track)
        })
        .collect())
}

pub fn dj_radios(payload: &Value) -> Result<Vec<Radio>, RemoteError> {
    let radios = array_at(payload, "/data")?;
    Ok(radios
        .iter()
        .filter_map(|r| {
            Some(Radio {
                id: r.get("id").and_then(Value::as_u64)?,
                name: str_field(r, "name"),
                host: r.pointer("/dj/nickname").and_then(Value::as_str).unwrap_or_default().to_string(),
            })
        })
        .collect())
}

pub fn user_playlists(payload: &Value) -> Result<Vec<PlaylistRef>, RemoteError> {
    let playlists = array_at(payload, "/playlist")?;
    Ok(playlists
        .iter()
        .filter_map(|p| {
            Some(PlaylistRef {
                id: p.get("id").and_then(Value::as_u64)?,
                name: str_field(p, "name"),
                track_count: p.get("trackCount").and_then(Value::as_u64).unwrap_or(0) as u32,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TEMPLATE: &str = "https://stream.test/{id}.mp3";

    #[test]
    fn decodes_short_and_long_song_spellings() {
        let payload = json!({ "data": [
            { "id": 1, "name": "One", "ar": [{ "name": "A" }, { "name": "B" }], "al": { "name": "X" }, "dt": 1000 },
            { "id": 2, "name": "Two", "artists": [{ "name": "C" }], "album": { "name": "Y" }, "duration": 2000 },
            { "name": "no id, skipped" }
        ]});

        let tracks = fm_songs(&payload, TEMPLATE).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].artist_line(), "A, B");
        assert_eq!(tracks[0].locator, "https://stream.test/1.mp3");
        assert_eq!(tracks[1].album, "Y");
        assert_eq!(tracks[1].duration_ms, 2000);
    }

    #[test]
    fn missing_list_is_malformed() {
        let err = daily_songs(&json!({ "data": {} }), TEMPLATE).unwrap_err();
        assert!(matches!(err, RemoteError::Malformed(_)));
    }

    #[test]
    fn programs_take_program_name_and_host() {
        let payload = json!({ "programs": [{
            "name": "Episode 4",
            "dj": { "nickname": "Host" },
            "mainSong": { "id": 40, "name": "raw", "dt": 60000 }
        }]});

        let tracks = dj_programs(&payload, TEMPLATE).unwrap();
        assert_eq!(tracks[0].title, "Episode 4");
        assert_eq!(tracks[0].artists, vec!["Host".to_string()]);
        assert_eq!(tracks[0].id, 40);
    }
}
