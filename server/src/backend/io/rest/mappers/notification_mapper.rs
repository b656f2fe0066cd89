use shared::{Notification, NotificationListResponse};

use crate::backend::domain::models::notification::Notification as DomainNotification;

use super::timestamp_to_dto;

pub struct NotificationMapper;

impl NotificationMapper {
    pub fn to_dto(notification: DomainNotification) -> Notification {
        Notification {
            id: notification.id,
            kind: notification.kind,
            data: notification.data,
            read_at: notification.read_at.map(timestamp_to_dto),
            created_at: timestamp_to_dto(notification.created_at),
        }
    }

    pub fn to_list_response(notifications: Vec<DomainNotification>, unread_count: u32) -> NotificationListResponse {
        NotificationListResponse {
            notifications: notifications.into_iter().map(Self::to_dto).collect(),
            unread_count,
        }
    }
}
