//! This module contains everything relating to [Data].

use std::collections::HashSet;
use std::sync::Arc;

use serenity::UserId;

use crate::attendance::AttendanceSource;
use crate::calendar::CalendarSettings;
use crate::guild::select::SelectionSettings;
use crate::perscom::PerscomClient;
use crate::serenity;

/// The data kept between shards
#[derive(Debug)]
pub struct Data {
    /// List of users to send bug notifications
    pub notify_list: HashSet<UserId>,
    /// Client for the PERSCOM api.
    pub perscom: PerscomClient,
    /// Where attendance records are read from.
    pub attendance: Arc<dyn AttendanceSource>,
    /// Renderer settings.
    pub calendar: CalendarSettings,
    /// Member selection menu settings.
    pub selection: SelectionSettings,
    /// First page of PERSCOM submissions to sync.
    pub start_page: u32,
    /// PERSCOM statuses whose applicants are removed.
    pub purge_statuses: Vec<String>,
}
