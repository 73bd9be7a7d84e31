//! Convenience methods over the request pipeline, one per platform
//! operation.

use http::Method;
use serde_json::Value;

use crate::client::Client;
use crate::codec::ParamList;
use crate::entities::Tweet;
use crate::error::{Error, Result};

/// Which timeline [`Client::load`] reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeline {
    /// The authenticated user's own statuses.
    User,
    /// The home timeline (user and friends).
    Home,
    /// Mentions of the authenticated user.
    Mentions,
}

impl Timeline {
    fn resource(self) -> &'static str {
        match self {
            Timeline::User => "statuses/user_timeline",
            Timeline::Home => "statuses/home_timeline",
            Timeline::Mentions => "statuses/mentions_timeline",
        }
    }
}

impl Client {
    /// Tests whether the held credentials are valid. A 401 answer means
    /// "not authenticated", not a hard failure.
    pub async fn authenticate(&self) -> Result<bool> {
        match self
            .request("account/verify_credentials", Method::GET, &ParamList::new())
            .await
        {
            Ok(payload) => Ok(payload.get("id").is_some()),
            Err(err) if err.status() == 401 => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Posts a status update.
    pub async fn send(&self, message: &str) -> Result<Tweet> {
        let data: ParamList = [("status", message)].into_iter().collect();
        let payload = self.request("statuses/update", Method::POST, &data).await?;
        tweet_from(payload)
    }

    /// Posts a status update with attached media files, uploading each
    /// file first.
    #[cfg(feature = "multipart")]
    pub async fn send_with_media(&self, message: &str, media: &[&std::path::Path]) -> Result<Tweet> {
        let mut media_ids = Vec::new();
        for path in media {
            media_ids.push(self.upload_media(path).await?);
        }
        let mut data: ParamList = [("status", message)].into_iter().collect();
        if !media_ids.is_empty() {
            data.set("media_ids", media_ids.join(","));
        }
        let payload = self.request("statuses/update", Method::POST, &data).await?;
        tweet_from(payload)
    }

    /// Uploads one media file and returns its media ID.
    #[cfg(feature = "multipart")]
    pub async fn upload_media(&self, path: &std::path::Path) -> Result<String> {
        let payload = self
            .request_with_files(
                crate::client::UPLOAD_URL,
                Method::POST,
                &ParamList::new(),
                &[("media", path)],
            )
            .await?;
        payload
            .get("media_id_string")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::Decode("no media_id_string in upload response".to_string()))
    }

    /// Sends a direct message to a user.
    pub async fn send_direct_message(&self, username: &str, text: &str) -> Result<Value> {
        let data: ParamList = [("text", text), ("screen_name", username)].into_iter().collect();
        self.request("direct_messages/new", Method::POST, &data).await
    }

    /// Follows a user.
    pub async fn follow(&self, username: &str) -> Result<Value> {
        let data: ParamList = [("screen_name", username)].into_iter().collect();
        self.request("friendships/create", Method::POST, &data).await
    }

    /// Deletes a status, returning its ID when the server confirms.
    pub async fn destroy(&self, id: &str) -> Result<Option<String>> {
        let payload = self
            .request(&format!("statuses/destroy/{}", id), Method::POST, &ParamList::new())
            .await?;
        Ok(payload
            .get("id_str")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// Reads the most recent statuses from a timeline.
    pub async fn load(&self, timeline: Timeline, count: u32, include_retweets: bool) -> Result<Vec<Tweet>> {
        let mut data = ParamList::new();
        data.set("count", count.to_string());
        data.set("include_rts", if include_retweets { "1" } else { "0" });
        let payload = self.cached_request(timeline.resource(), &data, None).await?;
        tweets_from(payload)
    }

    /// Searches recent statuses for a query.
    pub async fn search(&self, query: &str) -> Result<Vec<Tweet>> {
        let data: ParamList = [("q", query)].into_iter().collect();
        let payload = self.request("search/tweets", Method::GET, &data).await?;
        match payload {
            Value::Object(mut object) => match object.remove("statuses") {
                Some(statuses) => tweets_from(statuses),
                None => Err(Error::Decode("no statuses in search response".to_string())),
            },
            _ => Err(Error::Decode("unexpected search response shape".to_string())),
        }
    }

    /// Returns a user's profile by screen name.
    pub async fn load_user_info(&self, username: &str) -> Result<Value> {
        let data: ParamList = [("screen_name", username)].into_iter().collect();
        self.cached_request("users/show", &data, None).await
    }

    /// Returns a user's profile by ID.
    pub async fn load_user_info_by_id(&self, id: &str) -> Result<Value> {
        let data: ParamList = [("user_id", id)].into_iter().collect();
        self.cached_request("users/show", &data, None).await
    }

    /// Returns IDs of a user's followers, one cursor page at a time.
    pub async fn load_user_followers(&self, username: &str, count: u32, cursor: i64) -> Result<Value> {
        let mut data = ParamList::new();
        data.set("screen_name", username);
        data.set("count", count.to_string());
        data.set("cursor", cursor.to_string());
        self.cached_request("followers/ids", &data, None).await
    }

    /// Returns full follower profiles, one cursor page at a time.
    pub async fn load_user_followers_list(&self, username: &str, count: u32, cursor: i64) -> Result<Value> {
        let mut data = ParamList::new();
        data.set("screen_name", username);
        data.set("count", count.to_string());
        data.set("cursor", cursor.to_string());
        self.cached_request("followers/list", &data, None).await
    }
}

fn tweet_from(payload: Value) -> Result<Tweet> {
    serde_json::from_value(payload).map_err(|e| Error::Decode(e.to_string()))
}

fn tweets_from(payload: Value) -> Result<Vec<Tweet>> {
    serde_json::from_value(payload).map_err(|e| Error::Decode(e.to_string()))
}
