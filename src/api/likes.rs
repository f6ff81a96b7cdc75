use serde::Serialize;

use crate::api::{authorization::Authorization, Api};
use concord_models::{
    db_conn::DbConn,
    likes::{Like, LikeTarget},
    views::Liker,
    Connection, Result,
};

#[derive(Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub likes: Vec<Liker>,
}

fn toggle(conn: &mut Connection, user_id: i32, target: LikeTarget) -> Result<LikeState> {
    let liked = Like::toggle(conn, user_id, target)?;
    let likes = Like::likers(conn, target)?
        .iter()
        .map(Liker::from)
        .collect();
    Ok(LikeState { liked, likes })
}

#[post("/posts/<id>")]
pub async fn toggle_post(id: i32, auth: Authorization, conn: DbConn) -> Api<LikeState> {
    let user_id = auth.user_id;
    let state = conn
        .run(move |c| toggle(c, user_id, LikeTarget::Post(id)))
        .await?;
    auth.ok(state)
}

#[post("/comments/<id>")]
pub async fn toggle_comment(id: i32, auth: Authorization, conn: DbConn) -> Api<LikeState> {
    let user_id = auth.user_id;
    let state = conn
        .run(move |c| toggle(c, user_id, LikeTarget::Comment(id)))
        .await?;
    auth.ok(state)
}

#[cfg(test)]
mod tests {
    use crate::testing::TestApp;
    use rocket::http::Status;
    use serde_json::{json, Value};

    #[test]
    fn like_a_post_twice() {
        let app = TestApp::new();
        let users = app.fill_database();
        let post = app
            .post("/posts", &users[0], &json!({ "message": "Hello world" }))
            .dispatch()
            .into_json::<Value>()
            .unwrap()["post"]["_id"]
            .as_i64()
            .unwrap();
        let uri = format!("/likes/posts/{}", post);

        let response = app.post(uri.clone(), &users[1], &json!({})).dispatch();
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_json::<Value>().unwrap();
        assert_eq!(body["liked"], true);
        assert_eq!(body["likes"], json!([{ "_id": users[1].id, "username": "jane" }]));
        assert!(body["token"].is_string());

        let body = app
            .post(uri.clone(), &users[2], &json!({}))
            .dispatch()
            .into_json::<Value>()
            .unwrap();
        assert_eq!(body["likes"].as_array().unwrap().len(), 2);

        let body = app
            .post(uri, &users[1], &json!({}))
            .dispatch()
            .into_json::<Value>()
            .unwrap();
        assert_eq!(body["liked"], false);
        assert_eq!(body["likes"], json!([{ "_id": users[2].id, "username": "max" }]));
    }

    #[test]
    fn like_a_comment() {
        let app = TestApp::new();
        let users = app.fill_database();
        let post = app
            .post("/posts", &users[0], &json!({ "message": "Hello world" }))
            .dispatch()
            .into_json::<Value>()
            .unwrap()["post"]["_id"]
            .as_i64()
            .unwrap();
        let comment = app
            .post(
                "/comments",
                &users[1],
                &json!({ "postId": post, "message": "Welcome!" }),
            )
            .dispatch()
            .into_json::<Value>()
            .unwrap()["comment"]["_id"]
            .as_i64()
            .unwrap();

        let body = app
            .post(format!("/likes/comments/{}", comment), &users[0], &json!({}))
            .dispatch()
            .into_json::<Value>()
            .unwrap();
        assert_eq!(body["liked"], true);

        let posts = app
            .get("/posts", &users[0])
            .dispatch()
            .into_json::<Value>()
            .unwrap();
        assert_eq!(posts["posts"][0]["likes"], json!([]));
        assert_eq!(
            posts["posts"][0]["comments"][0]["likes"][0]["username"],
            "john"
        );
    }

    #[test]
    fn unknown_target() {
        let app = TestApp::new();
        let users = app.fill_database();
        for uri in &["/likes/posts/4242", "/likes/comments/4242"] {
            let response = app.post(*uri, &users[0], &json!({})).dispatch();
            assert_eq!(response.status(), Status::NotFound);
        }
    }
}
