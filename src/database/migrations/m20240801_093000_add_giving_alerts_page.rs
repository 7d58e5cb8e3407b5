//! Giving alerts page under Finance
//!
//! Adds the giving overview block type, the page and its route, an intro
//! block and the overview block, the scripture shortcode used by the alert
//! template and the alert e-mail itself.

use sea_orm_migration::prelude::*;

use crate::database::changes::{
    AttributeSpec, BlockSpec, BlockTypeSpec, ChangeSet, LavaShortcodeSpec, PageSpec,
    SystemCommunicationSpec,
};
use crate::database::guids;
use crate::database::schema::{LavaShortcode, SystemCommunication};

#[derive(DeriveMigrationName)]
pub struct Migration;

const OVERVIEW_TEMPLATE: &str = r#"{% for alert in GivingAlerts %}
<div class="alert alert-{{ alert.AlertType | Downcase }}">
  {{ alert.Person.FullName }}: {{ alert.Amount | FormatAsCurrency }}
</div>
{% endfor %}"#;

const ALERT_SUBJECT: &str = "Giving Alert: {{ Alert.Person.FullName }}";

const ALERT_BODY: &str = r#"{{ 'Global' | Attribute:'EmailHeader' }}
<p>{{ Alert.Person.FullName }} gave {{ Alert.Amount | FormatAsCurrency }} on
{{ Alert.TransactionDateTime | Date:'sd' }}, which triggered the
'{{ Alert.AlertTypeName }}' alert.</p>
{{ 'Global' | Attribute:'EmailFooter' }}"#;

const SCRIPTURE_MARKUP: &str =
    r#"<a href="https://www.biblegateway.com/passage/?search={{ reference | Url:'encode' }}">{{ reference }}</a>"#;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let changes = ChangeSet::new(manager.get_connection(), self.name());

        changes
            .upsert_block_type(&BlockTypeSpec {
                guid: guids::block_type::GIVING_OVERVIEW,
                name: "Giving Overview",
                description: "Summarises recent giving and open giving alerts",
                path: "~/Blocks/Finance/GivingOverview.ascx",
                category: "Finance",
            })
            .await?;
        changes
            .upsert_block_type_attribute(&AttributeSpec {
                guid: guids::attribute::GIVING_OVERVIEW_SHOW_ALERTS,
                block_type_guid: guids::block_type::GIVING_OVERVIEW,
                field_type_guid: guids::field_type::BOOLEAN,
                key: "ShowAlerts",
                name: "Show Alerts",
                description: "Whether open giving alerts are listed",
                order: 0,
                default_value: "True",
            })
            .await?;
        changes
            .upsert_block_type_attribute(&AttributeSpec {
                guid: guids::attribute::GIVING_OVERVIEW_LAVA_TEMPLATE,
                block_type_guid: guids::block_type::GIVING_OVERVIEW,
                field_type_guid: guids::field_type::CODE_EDITOR,
                key: "LavaTemplate",
                name: "Lava Template",
                description: "Template used to render each alert",
                order: 1,
                default_value: OVERVIEW_TEMPLATE,
            })
            .await?;

        changes
            .add_page(&PageSpec {
                guid: guids::page::GIVING_ALERTS,
                parent_page_guid: Some(guids::page::FINANCE),
                layout_guid: Some(guids::layout::FULL_WIDTH),
                internal_name: "Giving Alerts",
                page_title: "Giving Alerts",
                description: "Alerts raised by giving automation",
                icon_css_class: "fa fa-exclamation-triangle",
                order: 5,
            })
            .await?;
        changes
            .add_or_update_page_route(
                guids::page::GIVING_ALERTS,
                "finance/giving-alerts",
                guids::page_route::GIVING_ALERTS,
            )
            .await?;

        changes
            .add_block(&BlockSpec {
                guid: guids::block::GIVING_ALERTS_INTRO,
                block_type_guid: guids::block_type::HTML_CONTENT,
                page_guid: Some(guids::page::GIVING_ALERTS),
                layout_guid: None,
                zone: "Main",
                name: "Intro",
                order: 0,
            })
            .await?;
        changes
            .add_block_attribute_value(
                guids::block::GIVING_ALERTS_INTRO,
                guids::attribute::HTML_CONTENT_CACHE_DURATION,
                "3600",
            )
            .await?;

        changes
            .add_block(&BlockSpec {
                guid: guids::block::GIVING_ALERTS_OVERVIEW,
                block_type_guid: guids::block_type::GIVING_OVERVIEW,
                page_guid: Some(guids::page::GIVING_ALERTS),
                layout_guid: None,
                zone: "Main",
                name: "Giving Overview",
                order: 1,
            })
            .await?;
        changes
            .add_block_attribute_value(
                guids::block::GIVING_ALERTS_OVERVIEW,
                guids::attribute::GIVING_OVERVIEW_SHOW_ALERTS,
                "True",
            )
            .await?;
        changes
            .add_block_attribute_value(
                guids::block::GIVING_ALERTS_OVERVIEW,
                guids::attribute::GIVING_OVERVIEW_LAVA_TEMPLATE,
                OVERVIEW_TEMPLATE,
            )
            .await?;

        changes
            .upsert_lava_shortcode(&LavaShortcodeSpec {
                guid: guids::lava_shortcode::SCRIPTURE_LINK,
                name: "Scripture Link",
                tag_name: "scripturelink",
                tag_type: 1,
                description: "Links a scripture reference to an online Bible",
                markup: SCRIPTURE_MARKUP,
                parameters: "reference^",
            })
            .await?;
        changes
            .upsert_system_communication(&SystemCommunicationSpec {
                guid: guids::system_communication::GIVING_ALERT,
                category_guid: Some(guids::category::FINANCE_COMMUNICATIONS),
                title: "Giving Alert",
                subject: "",
                body: "",
            })
            .await?;
        changes
            .update_system_communication(
                guids::system_communication::GIVING_ALERT,
                ALERT_SUBJECT,
                ALERT_BODY,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let changes = ChangeSet::new(manager.get_connection(), self.name());

        changes
            .delete_by_guid(
                SystemCommunication::Table,
                guids::system_communication::GIVING_ALERT,
            )
            .await?;
        changes
            .delete_by_guid(LavaShortcode::Table, guids::lava_shortcode::SCRIPTURE_LINK)
            .await?;
        changes.delete_block(guids::block::GIVING_ALERTS_OVERVIEW).await?;
        changes.delete_block(guids::block::GIVING_ALERTS_INTRO).await?;
        changes
            .delete_page_route(guids::page_route::GIVING_ALERTS)
            .await?;
        changes.delete_page(guids::page::GIVING_ALERTS).await?;
        changes
            .delete_attribute(guids::attribute::GIVING_OVERVIEW_LAVA_TEMPLATE)
            .await?;
        changes
            .delete_attribute(guids::attribute::GIVING_OVERVIEW_SHOW_ALERTS)
            .await?;
        changes
            .delete_block_type(guids::block_type::GIVING_OVERVIEW)
            .await?;

        Ok(())
    }
}
