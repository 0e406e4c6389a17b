//! Page selectors for the job portal. Class names are bare; XPaths are complete.

// search results
pub(crate) const RESULTS_LIST: &str = "jobs-search-results-list";
pub(crate) const RESULTS_LIST_READY: &str = "jobs-search-results__list";
pub(crate) const RESULT_TILE: &str = "jobs-search-results__list-item";
pub(crate) const TILE_TITLE: &str = "job-card-list__title";
pub(crate) const TILE_COMPANY: &str = "job-card-container__primary-description";
pub(crate) const TILE_LOCATION: &str = "job-card-container__metadata-item";
pub(crate) const TILE_APPLY_METHOD: &str = "job-card-container__apply-method";

// job page
pub(crate) const PREMIUM_URL_FRAGMENT: &str = "linkedin.com/premium";
pub(crate) const EASY_APPLY_BUTTONS: &str =
    "//button[contains(@class, \"jobs-apply-button\") and contains(., \"Easy Apply\")]";
pub(crate) const EASY_APPLY_ARIA: &str = "//button[contains(@aria-label, \"Easy Apply to\")]";
pub(crate) const EASY_APPLY_TEXT: &str =
    "//button[contains(text(), \"Easy Apply\") or contains(text(), \"Apply now\")]";
pub(crate) const SEE_MORE_DESCRIPTION: &str =
    "//button[@aria-label=\"Click to see more description\"]";
pub(crate) const DESCRIPTION_TEXT: &str = "jobs-description-content__text";
pub(crate) const HIRING_TEAM_HEADING: &str = "//h2[text()=\"Meet the hiring team\"]";
pub(crate) const RECRUITER_PROFILE_LINK: &str =
    ".//following::a[contains(@href, \"linkedin.com/in/\")]";

// easy apply modal
pub(crate) const FORM_CONTAINER: &str = "jobs-easy-apply-content";
pub(crate) const FORM_SECTION: &str = "pb4";
pub(crate) const QUESTION_LABEL: &str = "label";
pub(crate) const FILE_INPUT: &str = "input[type=\"file\"]";
pub(crate) const SELECT: &str = "select";
pub(crate) const OPTION: &str = "option";
pub(crate) const TEXT_INPUT: &str =
    "input:not([type=\"radio\"]):not([type=\"checkbox\"]):not([type=\"file\"]), textarea";
pub(crate) const RADIO_INPUT: &str = "input[type=\"radio\"]";
pub(crate) const PRIMARY_ACTION: &str = "artdeco-button--primary";
pub(crate) const SUBMIT_LABEL: &str = "submit application";
pub(crate) const INLINE_ERROR: &str = "artdeco-inline-feedback--error";
pub(crate) const UNFOLLOW_TOGGLE: &str =
    "//label[contains(.,'to stay up to date with their page.')]";
pub(crate) const MODAL_DISMISS: &str = "artdeco-modal__dismiss";
pub(crate) const MODAL_CONFIRM: &str = "artdeco-modal__confirm-dialog-btn";

// login
pub(crate) const USERNAME_FIELD: &str = "username";
pub(crate) const SUBMIT_BUTTON: &str = "//button[@type='submit']";
pub(crate) const CAPTCHA_CHALLENGE: &str = "captcha-challenge";
pub(crate) const SECURITY_CHALLENGE: &str = "security-verification-challenge";
