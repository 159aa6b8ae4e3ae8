use serde::Deserialize;
use shared::media::{ManagedItem, MediaType};

// Internal struct for deserializing movie/series rows; both APIs share these fields.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ArrTitle {
    /// Absent (or 0) on lookup results not yet in the library.
    #[serde(default)]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub root_folder_path: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

impl ArrTitle {
    /// Library id, if the title is already managed.
    pub fn managed_id(&self) -> Option<i64> {
        self.id.filter(|id| *id > 0)
    }

    pub fn into_managed(self, media_type: MediaType) -> Option<ManagedItem> {
        let id = self.managed_id()?;
        Some(ManagedItem {
            id,
            media_type,
            title: self.title,
            // the APIs report 0 for an unknown year
            year: self.year.filter(|y| *y > 0),
            genres: self.genres,
            root_folder_path: self.root_folder_path.or(self.path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_row() {
        let row: ArrTitle = serde_json::from_str(
            r#"{"id":12,"title":"The Matrix","year":1999,"tmdbId":603,
                "genres":["Action","Science Fiction"],"rootFolderPath":"/movies/",
                "path":"/movies/The Matrix (1999)","monitored":true}"#,
        )
        .unwrap();
        let item = row.into_managed(MediaType::Movie).unwrap();
        assert_eq!(item.id, 12);
        assert_eq!(item.year, Some(1999));
        assert_eq!(item.root_folder_path.as_deref(), Some("/movies/"));
        assert_eq!(item.genres.len(), 2);
    }

    #[test]
    fn test_lookup_row_is_unmanaged() {
        let row: ArrTitle =
            serde_json::from_str(r#"{"title":"Firefly","year":0,"tvdbId":78874,"seasons":[]}"#)
                .unwrap();
        assert_eq!(row.managed_id(), None);
        assert!(row.into_managed(MediaType::Series).is_none());
    }
}
