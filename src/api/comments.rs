use rocket::{http::Status, serde::json::Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::api::{authorization::Authorization, Api};
use concord_models::{
    comments::{Comment, NewComment},
    db_conn::DbConn,
    posts::Post,
    views::CommentView,
    Error,
};

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewCommentData {
    pub post_id: i32,
    #[validate(length(min = 1, message = "Your comment can't be empty"))]
    pub message: String,
}

#[derive(Deserialize, Validate)]
pub struct CommentData {
    #[validate(length(min = 1, message = "Your comment can't be empty"))]
    pub message: String,
}

#[derive(Serialize)]
pub struct CommentBody {
    pub comment: CommentView,
}

#[post("/", data = "<data>")]
pub async fn create(
    auth: Authorization,
    conn: DbConn,
    data: Json<NewCommentData>,
) -> Api<CommentBody> {
    let mut data = data.into_inner();
    data.message = data.message.trim().to_owned();
    data.validate()?;

    let author_id = auth.user_id;
    let comment = conn
        .run(move |c| {
            let post = Post::get(c, data.post_id)?;
            let comment = Comment::insert(
                c,
                NewComment {
                    post_id: post.id,
                    author_id,
                    message: data.message,
                },
            )?;
            info!("User {} commented on post {}", author_id, post.id);
            CommentView::populate_one(c, comment)
        })
        .await?;
    auth.reply(Status::Created, CommentBody { comment })
}

#[put("/<id>", data = "<data>")]
pub async fn update(
    id: i32,
    auth: Authorization,
    conn: DbConn,
    data: Json<CommentData>,
) -> Api<CommentBody> {
    let mut data = data.into_inner();
    data.message = data.message.trim().to_owned();
    data.validate()?;

    let user_id = auth.user_id;
    let comment = conn
        .run(move |c| {
            let comment = Comment::get(c, id)?;
            if comment.author_id != user_id {
                return Err(Error::Forbidden);
            }
            let comment = comment.edit(c, data.message)?;
            CommentView::populate_one(c, comment)
        })
        .await?;
    auth.reply(Status::Accepted, CommentBody { comment })
}

#[delete("/<id>")]
pub async fn delete(id: i32, auth: Authorization, conn: DbConn) -> Api<CommentBody> {
    let user_id = auth.user_id;
    let comment = conn
        .run(move |c| {
            let comment = Comment::get(c, id)?;
            if !comment.can_delete(c, user_id)? {
                return Err(Error::Forbidden);
            }
            let view = CommentView::populate_one(c, comment.clone())?;
            comment.delete(c)?;
            Ok(view)
        })
        .await?;
    auth.reply(Status::Accepted, CommentBody { comment })
}

#[cfg(test)]
mod tests {
    use crate::testing::TestApp;
    use concord_models::users::User;
    use rocket::http::Status;
    use serde_json::{json, Value};

    fn new_post(app: &TestApp, author: &User) -> i64 {
        app.post("/posts", author, &json!({ "message": "Hello world" }))
            .dispatch()
            .into_json::<Value>()
            .unwrap()["post"]["_id"]
            .as_i64()
            .unwrap()
    }

    #[test]
    fn comment_a_post() {
        let app = TestApp::new();
        let users = app.fill_database();
        let post = new_post(&app, &users[0]);

        let response = app
            .post(
                "/comments",
                &users[1],
                &json!({ "postId": post, "message": "Welcome!" }),
            )
            .dispatch();
        assert_eq!(response.status(), Status::Created);
        let body = response.into_json::<Value>().unwrap();
        assert_eq!(body["comment"]["postId"], post);
        assert_eq!(body["comment"]["author"]["username"], "jane");
        assert_eq!(body["comment"]["isEdited"], false);

        let posts = app
            .get("/posts", &users[2])
            .dispatch()
            .into_json::<Value>()
            .unwrap();
        assert_eq!(posts["posts"][0]["comments"][0]["message"], "Welcome!");
    }

    #[test]
    fn invalid_comments() {
        let app = TestApp::new();
        let users = app.fill_database();
        let post = new_post(&app, &users[0]);

        let response = app
            .post("/comments", &users[1], &json!({ "postId": 4242, "message": "Hi" }))
            .dispatch();
        assert_eq!(response.status(), Status::NotFound);
        let response = app
            .post("/comments", &users[1], &json!({ "postId": post, "message": "  " }))
            .dispatch();
        assert_eq!(response.status(), Status::BadRequest);
    }

    #[test]
    fn edit_and_delete() {
        let app = TestApp::new();
        let users = app.fill_database();
        let post = new_post(&app, &users[0]);
        let comment_of = |author: &User| {
            app.post(
                "/comments",
                author,
                &json!({ "postId": post, "message": "Welcome!" }),
            )
            .dispatch()
            .into_json::<Value>()
            .unwrap()["comment"]["_id"]
                .as_i64()
                .unwrap()
        };
        let by_jane = comment_of(&users[1]);
        let by_max = comment_of(&users[2]);

        let response = app
            .put(format!("/comments/{}", by_jane), &users[0], &json!({ "message": "Nope" }))
            .dispatch();
        assert_eq!(response.status(), Status::Forbidden);
        let response = app
            .put(format!("/comments/{}", by_jane), &users[1], &json!({ "message": "Hello!" }))
            .dispatch();
        assert_eq!(response.status(), Status::Accepted);
        let body = response.into_json::<Value>().unwrap();
        assert_eq!(body["comment"]["message"], "Hello!");
        assert_eq!(body["comment"]["isEdited"], true);

        // Max can't delete Jane's comment, but John wrote the post.
        let response = app.delete(format!("/comments/{}", by_jane), &users[2]).dispatch();
        assert_eq!(response.status(), Status::Forbidden);
        let response = app.delete(format!("/comments/{}", by_jane), &users[0]).dispatch();
        assert_eq!(response.status(), Status::Accepted);
        assert_eq!(
            response.into_json::<Value>().unwrap()["comment"]["_id"],
            by_jane
        );
        let response = app.delete(format!("/comments/{}", by_max), &users[2]).dispatch();
        assert_eq!(response.status(), Status::Accepted);
    }
}
