//! Folder, context, goal and location endpoints

use super::client::ToodledoClient;
use crate::error::Result;
use crate::models::{Context, Folder, Goal, Location};

impl ToodledoClient {
    pub async fn folders(&self) -> Result<Vec<Folder>> {
        Ok(self.get_list("/folders/get.php", &[]).await?.1)
    }

    pub async fn contexts(&self) -> Result<Vec<Context>> {
        Ok(self.get_list("/contexts/get.php", &[]).await?.1)
    }

    pub async fn goals(&self) -> Result<Vec<Goal>> {
        Ok(self.get_list("/goals/get.php", &[]).await?.1)
    }

    pub async fn locations(&self) -> Result<Vec<Location>> {
        Ok(self.get_list("/locations/get.php", &[]).await?.1)
    }
}

#[cfg(test)]
mod tests {
    use crate::api::client::tests::authorized_client;
    use crate::error::Error;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_folders_and_contexts() {
        let mut server = Server::new_async().await;
        let _folders = server
            .mock("GET", "/folders/get.php")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"id":123,"name":"Shopping","private":0,"archived":0,"ord":1}]"#)
            .create_async()
            .await;
        let _contexts = server
            .mock("GET", "/contexts/get.php")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"id":5,"name":"@Work"},{"id":6,"name":"@Home","private":1}]"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = authorized_client(&server.url(), dir.path());

        let folders = client.folders().await.unwrap();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name, "Shopping");

        let contexts = client.contexts().await.unwrap();
        assert_eq!(contexts[1].private, Some(1));
    }

    #[tokio::test]
    async fn test_goals_and_locations() {
        let mut server = Server::new_async().await;
        let _goals = server
            .mock("GET", "/goals/get.php")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"id":1,"name":"Get fit","level":0,"archived":0,"contributes":0,"note":""}]"#)
            .create_async()
            .await;
        let _locations = server
            .mock("GET", "/locations/get.php")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"id":9,"name":"Office","description":"","lat":40.71,"lon":-74.0}]"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = authorized_client(&server.url(), dir.path());

        assert_eq!(client.goals().await.unwrap()[0].level, Some(0));
        assert_eq!(client.locations().await.unwrap()[0].lat, Some(40.71));
    }

    #[tokio::test]
    async fn test_item_missing_required_field() {
        let mut server = Server::new_async().await;
        let _folders = server
            .mock("GET", "/folders/get.php")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"name":"No id"}]"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = authorized_client(&server.url(), dir.path());
        let err = client.folders().await.unwrap_err();
        assert!(matches!(err, Error::ApiRequestFailed { .. }), "got {err:?}");
    }
}
