//! Well-known GUIDs of system rows seeded and referenced by the migration units

pub mod entity_type {
    pub const BLOCK: &str = "d89555ca-9ae4-4d62-8af1-e5e463c1ef65";
    pub const PAGE: &str = "e104dcdf-247c-4ced-a119-8cc51632761f";
    pub const DEFINED_TYPE: &str = "6028d502-79f4-4a74-9323-525e90f900c7";
    pub const SYSTEM_COMMUNICATION: &str = "1e0dc4b4-5d4b-4f36-8c3a-0f6b3f8a2d10";
    pub const SERVICE_JOB: &str = "52766196-a72f-4f60-997a-78e19508843d";
}

pub mod field_type {
    pub const TEXT: &str = "9c204cd0-1233-41c5-818a-c5da439445aa";
    pub const BOOLEAN: &str = "1edafded-dfe6-4334-b019-6eecba89e05a";
    pub const INTEGER: &str = "a75dfc58-7a1b-4799-bf31-451b2bbe38ff";
    pub const CODE_EDITOR: &str = "1d0d3794-c210-48a8-8c68-3fbec08a6ba5";
    pub const PAGE_REFERENCE: &str = "bd53f9c9-eba9-4d3f-82ea-de5dd34a8108";
}

pub mod layout {
    pub const FULL_WIDTH: &str = "d65f783d-87a9-4cc9-8110-e83466a0eadb";
    pub const RIGHT_SIDEBAR: &str = "0cb60906-6b74-44fd-ab25-026050ef70eb";
}

pub mod page {
    pub const INTERNAL_HOMEPAGE: &str = "20f97a93-7949-4c2a-8a5e-c756fe8585ca";
    pub const FINANCE: &str = "7beb7569-c485-40a0-a609-b0678f6f7240";
    pub const GIVING_ALERTS: &str = "a3e1f7d2-5b4c-4e8a-9d6f-2c1b0a9e8d71";
    pub const MY_ACCOUNT: &str = "c0854f84-2e8b-479c-a3fb-6b47be89b795";
}

pub mod page_route {
    pub const GIVING_ALERTS: &str = "5f0e2c7b-8a4d-4b6e-9c1f-3d2a7e6b4c58";
    pub const MY_ACCOUNT: &str = "9e6a1c3d-0b7f-4e2a-8d5c-6f4b3a2e1d90";
}

pub mod block_type {
    pub const HTML_CONTENT: &str = "19b61d65-37e3-459f-a44f-def67a4e5f4d";
    pub const GIVING_OVERVIEW: &str = "896d807d-2110-4e13-a1e7-9f2f5e0c6b2a";
    pub const LEGACY_TRANSACTION_LIST: &str = "e04320bc-67c3-452d-9ef6-d74d8c177154";
    pub const TRANSACTION_LIST: &str = "a3e5b3b6-7f4d-4c1a-9b2e-8d6f0c5a4e31";
}

pub mod block {
    pub const GIVING_ALERTS_OVERVIEW: &str = "0b7e5d3c-2a1f-4e9d-8c6b-5a4f3e2d1c0b";
    pub const GIVING_ALERTS_INTRO: &str = "6c2d8e4f-1a3b-4c5d-9e7f-0a1b2c3d4e5f";
}

pub mod attribute {
    pub const GIVING_OVERVIEW_SHOW_ALERTS: &str = "4b9a2e6c-7d1f-4a3b-8e5c-9f0d1a2b3c4d";
    pub const GIVING_OVERVIEW_LAVA_TEMPLATE: &str = "8e1d3c5b-2f4a-4b6c-9d7e-0f1a2b3c4d5e";
    pub const HTML_CONTENT_CACHE_DURATION: &str = "4da2c1a3-9f2b-4e6d-8a7c-5b0e1d3f2a64";
    pub const LEGACY_TRANSACTION_LIST_TITLE: &str = "2e7c9a1b-4d6f-4e8a-b0c2-d4e6f8a0b2c4";
    pub const LEGACY_TRANSACTION_LIST_SHOW_ACCOUNT: &str = "7a9c1e3f-5b7d-4f9a-b1c3-e5f7a9b1c3d5";
    pub const LEGACY_TRANSACTION_LIST_CONTEXT_ENTITY: &str = "3f5a7c9e-1b3d-4f5a-8c9e-1b3d5f7a9c1e";
    pub const TRANSACTION_LIST_TITLE: &str = "9b1d3f5a-7c9e-4b1d-8f5a-7c9e1b3d5f7a";
    pub const TRANSACTION_LIST_SHOW_ACCOUNT: &str = "c3e5a7b9-d1f3-4a5c-9e7b-9d1f3a5c7e9b";
    pub const TRANSACTION_LIST_CONTEXT_ENTITY: &str = "e5a7c9b1-f3a5-4c7e-8b9d-1f3a5c7e9b1d";
}

pub mod category {
    pub const FINANCE_COMMUNICATIONS: &str = "a9e3c4f1-6b2d-4e8a-9c7f-1d5b3a2e6f48";
    pub const PERSON_DEFINED_TYPES: &str = "e3d1c7b5-9a2f-4d6e-8b4c-0f7a6e5d3c21";
}

pub mod defined_type {
    pub const RECORD_STATUS: &str = "8522badd-2871-45a5-81dd-c76da07e2e7e";
    pub const CONNECTION_STATUS: &str = "2e6540ea-63f0-40fe-be50-f2a84735e600";
}

pub mod defined_value {
    pub const RECORD_STATUS_ACTIVE: &str = "618f906c-c33d-4fa3-8aef-e58cb7b63f1e";
    pub const RECORD_STATUS_INACTIVE: &str = "1dad99d5-41a9-4865-8366-f269902b80a4";
    pub const RECORD_STATUS_PENDING: &str = "283999ec-7346-42e3-b807-bce9b2babb49";
    pub const CONNECTION_STATUS_VISITOR: &str = "b91ba046-bc1e-400c-b85d-638c1f4e0ce2";
    pub const CONNECTION_STATUS_WEB_PROSPECT: &str = "368dd475-242c-49c4-a42c-7278be690cc2";
}

pub mod service_job {
    pub const GIVING_AUTOMATION: &str = "b6dee0e1-2d3c-4b4f-9d4e-5e9b6a3f1c10";
}

pub mod system_communication {
    pub const GIVING_ALERT: &str = "f3b1a2c4-8d6e-4f0a-9b2c-7e5d4a3f1b6c";
}

pub mod lava_shortcode {
    pub const SCRIPTURE_LINK: &str = "2a7c3e1d-9b4f-4e6a-8d2c-5f1e3b7a9c4d";
}

pub mod group_type {
    pub const LEGACY_SERVING_TEAM: &str = "2c42b2d4-1c5f-4ad5-a9ad-08631b872ac4";
}
