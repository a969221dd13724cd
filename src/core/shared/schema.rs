diesel::table! {
    worksites (id) {
        id -> Uuid,
        name -> Text,
        description -> Nullable<Text>,
        client_id -> Text,
        start_date -> Nullable<Date>,
        end_date -> Nullable<Date>,
        status -> Text,
        budget -> Nullable<Float8>,
        address -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    tasks (id) {
        id -> Uuid,
        title -> Text,
        description -> Nullable<Text>,
        worksite_id -> Nullable<Uuid>,
        assignee_id -> Nullable<Uuid>,
        start_date -> Nullable<Date>,
        end_date -> Nullable<Date>,
        priority -> Text,
        status -> Text,
        progress -> Int4,
        dependencies -> Array<Uuid>,
        resource_ids -> Array<Uuid>,
        completed_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    sub_tasks (id) {
        id -> Uuid,
        task_id -> Uuid,
        title -> Text,
        completed -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    teams (id) {
        id -> Uuid,
        name -> Text,
        members -> Array<Uuid>,
        leader_id -> Nullable<Uuid>,
        specialty -> Nullable<Text>,
        capacity -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    resources (id) {
        id -> Uuid,
        name -> Text,
        kind -> Text,
        available -> Bool,
        cost -> Nullable<Float8>,
        location -> Nullable<Text>,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    users (id) {
        id -> Uuid,
        name -> Text,
        email -> Text,
        role -> Text,
        team_id -> Nullable<Uuid>,
        skills -> Array<Text>,
        available -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    planning_entries (id) {
        id -> Uuid,
        task_id -> Uuid,
        resource_id -> Nullable<Uuid>,
        user_id -> Nullable<Uuid>,
        day -> Date,
        start_hour -> Nullable<Time>,
        end_hour -> Nullable<Time>,
        status -> Text,
        recurrence -> Text,
        history -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    tags (id) {
        id -> Uuid,
        name -> Text,
        color -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    settings (key) {
        key -> Text,
        value -> Jsonb,
        updated_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    worksites,
    tasks,
    sub_tasks,
    teams,
    resources,
    users,
    planning_entries,
    tags,
    settings,
);
