table! {
    alliances (id) {
        id -> Integer,
        sender_id -> Integer,
        receiver_id -> Integer,
        status -> Text,
        creation_date -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    comments (id) {
        id -> Integer,
        post_id -> Integer,
        author_id -> Integer,
        message -> Text,
        is_edited -> Bool,
        creation_date -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    likes (id) {
        id -> Integer,
        user_id -> Integer,
        post_id -> Nullable<Integer>,
        comment_id -> Nullable<Integer>,
        creation_date -> Timestamp,
    }
}

table! {
    posts (id) {
        id -> Integer,
        author_id -> Integer,
        message -> Text,
        image -> Nullable<Text>,
        is_edited -> Bool,
        creation_date -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    users (id) {
        id -> Integer,
        email -> Text,
        hashed_password -> Text,
        username -> Text,
        firstname -> Text,
        lastname -> Text,
        location -> Text,
        profile_picture -> Text,
        bio -> Text,
        creation_date -> Timestamp,
    }
}

joinable!(comments -> posts (post_id));
joinable!(comments -> users (author_id));
joinable!(likes -> comments (comment_id));
joinable!(likes -> posts (post_id));
joinable!(likes -> users (user_id));
joinable!(posts -> users (author_id));

allow_tables_to_appear_in_same_query!(alliances, comments, likes, posts, users,);
